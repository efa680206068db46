//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::{ComponentType, CustomerId, ProductId, ProductType, VendorId};

/// Back-office administration: administrative divisions, customers and products
#[derive(Parser, Debug)]
#[command(name = "compass")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(short, long, global = true, env = "COMPASS_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Listen port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage administrative divisions
    Div {
        #[command(subcommand)]
        command: DivCommands,
    },

    /// Manage customers
    Customer {
        #[command(subcommand)]
        command: CustomerCommands,
    },

    /// Manage vendors
    Vendor {
        #[command(subcommand)]
        command: VendorCommands,
    },

    /// Manage the product catalog
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Divisions are addressed by their unique name.
#[derive(Subcommand, Debug)]
pub enum DivCommands {
    /// Create a division
    Add {
        name: String,
        /// Parent division (root when omitted)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Move a division with its subtree
    Mv {
        name: String,
        /// New parent (becomes a root when omitted)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Rename a division
    Rename { name: String, new_name: String },
    /// Delete a division with its subtree
    Rm { name: String },
    /// Show the path from the root
    Path { name: String },
    /// Show the forest as a tree
    Tree,
    /// Show the indented dropdown labels
    Options {
        /// Render `<option>` elements
        #[arg(long)]
        html: bool,
    },
    /// Print the nested JSON tree with customers as leaves
    Json {
        /// Only this subtree
        #[arg(short, long)]
        root: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CustomerCommands {
    /// Create a customer
    Add {
        name: String,
        #[arg(long)]
        division: Option<String>,
        #[arg(long)]
        intro: Option<String>,
    },
    /// Attach a customer to a division (detach when omitted)
    Assign {
        id: CustomerId,
        #[arg(long)]
        division: Option<String>,
    },
    /// Show the customer detail as JSON
    Show { id: CustomerId },
    /// List customers
    List {
        /// Depth of the customer's division
        #[arg(long)]
        level: Option<u32>,
        /// Parent of the customer's division
        #[arg(long)]
        parent: Option<String>,
    },
    /// Associate a product with a customer
    Link { id: CustomerId, product: ProductId },
}

#[derive(Subcommand, Debug)]
pub enum VendorCommands {
    /// Create a vendor
    Add {
        name: String,
        #[arg(long)]
        remark: Option<String>,
    },
    /// List vendors, newest first
    List,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// Create a product
    Add {
        name: String,
        /// PLATFORM_SOFTWARE, PC_TERMINAL_SOFTWARE, HARDWARE, STANDALONE_SOFTWARE or MOBILE_APP
        #[arg(short = 't', long = "type")]
        product_type: ProductType,
        #[arg(long)]
        vendor: Option<VendorId>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a component to a product
    Component {
        id: ProductId,
        name: String,
        /// SOFTWARE_MODULE or HARDWARE
        #[arg(short = 't', long = "type")]
        component_type: ComponentType,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a model to a product
    Model {
        id: ProductId,
        name: String,
        #[arg(long)]
        remark: Option<String>,
    },
    /// List products, newest first
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
}
