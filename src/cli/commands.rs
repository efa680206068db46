//! Command dispatch: each subcommand resolves its arguments and calls one service.

use std::io;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::api;
use crate::application::services::{CustomerFilter, SelectOption};
use crate::application::ApplicationError;
use crate::cli::args::{
    Cli, Commands, ConfigCommands, CustomerCommands, DivCommands, ProductCommands, VendorCommands,
};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{Customer, DivisionId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `compass --help`".to_string(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);
    if let Commands::Config { command } = command {
        return config_command(command, &settings);
    }

    let container = ServiceContainer::new(settings)?;
    match command {
        Commands::Serve { host, port } => serve(container, host.clone(), *port),
        Commands::Div { command } => div_command(command, &container),
        Commands::Customer { command } => customer_command(command, &container),
        Commands::Vendor { command } => vendor_command(command, &container),
        Commands::Product { command } => product_command(command, &container),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ApplicationError::OperationFailed {
            context: "render JSON".to_string(),
            source: Box::new(e),
        }
        .into()
    })
}

#[instrument(skip(container))]
fn serve(container: ServiceContainer, host: Option<String>, port: Option<u16>) -> CliResult<()> {
    let mut server = container.settings.server.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    let addr = server.bind_addr();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| InfraError::io("start async runtime", e))?;
    runtime.block_on(api::serve(Arc::new(container), &addr))?;
    Ok(())
}

/// Resolve an optional division name to its id.
fn division_id(container: &ServiceContainer, name: Option<&str>) -> CliResult<Option<DivisionId>> {
    Ok(name
        .map(|n| container.divisions.find(n))
        .transpose()?
        .map(|d| d.id))
}

#[instrument(skip(container))]
fn div_command(command: &DivCommands, container: &ServiceContainer) -> CliResult<()> {
    let divisions = &container.divisions;
    match command {
        DivCommands::Add { name, parent } => {
            let parent = division_id(container, parent.as_deref())?;
            let division = divisions.insert(name, parent)?;
            output::success(&format!(
                "created {} ({})",
                divisions.display_path(division.id)?,
                division.id
            ));
        }
        DivCommands::Mv { name, parent } => {
            let id = divisions.find(name)?.id;
            let parent = division_id(container, parent.as_deref())?;
            let moved = divisions.move_to(id, parent)?;
            output::success(&format!(
                "moved to {} (depth {})",
                divisions.display_path(moved.id)?,
                moved.depth()
            ));
        }
        DivCommands::Rename { name, new_name } => {
            let id = divisions.find(name)?.id;
            let renamed = divisions.rename(id, new_name)?;
            output::success(&format!("renamed {} to {}", name, renamed.name));
        }
        DivCommands::Rm { name } => {
            let id = divisions.find(name)?.id;
            let outcome = divisions.delete(id)?;
            output::success(&format!("deleted {} divisions", outcome.removed.len()));
            for division in &outcome.removed {
                output::removed(&division.name);
            }
            if !outcome.detached_customers.is_empty() {
                output::warning(&format!(
                    "{} customers lost their division",
                    outcome.detached_customers.len()
                ));
            }
        }
        DivCommands::Path { name } => {
            let id = divisions.find(name)?.id;
            output::info(&divisions.display_path(id)?);
        }
        DivCommands::Tree => {
            output::info(&container.presentation.render_tree()?);
        }
        DivCommands::Options { html } => {
            let options = container.presentation.select_options()?;
            for option in &options {
                output::info(&render_option(option, *html));
            }
        }
        DivCommands::Json { root } => {
            let root = division_id(container, root.as_deref())?;
            let tree = container.presentation.nested_tree(root)?;
            output::info(&to_json(&tree)?);
        }
    }
    Ok(())
}

fn render_option(option: &SelectOption, html: bool) -> String {
    if html {
        option.to_html()
    } else {
        format!("{:>5}  {}", option.value, option.label)
    }
}

#[instrument(skip(container))]
fn customer_command(command: &CustomerCommands, container: &ServiceContainer) -> CliResult<()> {
    let customers = &container.customers;
    match command {
        CustomerCommands::Add {
            name,
            division,
            intro,
        } => {
            let division = division_id(container, division.as_deref())?;
            let customer = customers.create(name, division, intro.clone())?;
            output::success(&format!(
                "created {} ({})",
                customers.label(customer.id)?,
                customer.id
            ));
        }
        CustomerCommands::Assign { id, division } => {
            let division = division_id(container, division.as_deref())?;
            let customer = customers.assign(*id, division)?;
            output::success(&customers.label(customer.id)?);
        }
        CustomerCommands::Show { id } => {
            output::info(&to_json(&customers.detail(*id)?)?);
        }
        CustomerCommands::List { level, parent } => {
            let filter = CustomerFilter {
                level: *level,
                parent: division_id(container, parent.as_deref())?,
            };
            let rows = customers.list_filtered(filter)?;
            print_customers(container, &rows)?;
        }
        CustomerCommands::Link { id, product } => {
            let customer = customers.link_product(*id, *product)?;
            output::success(&format!(
                "{} now has {} products",
                customer.name,
                customer.products.len()
            ));
        }
    }
    Ok(())
}

fn print_customers(container: &ServiceContainer, rows: &[Customer]) -> CliResult<()> {
    output::header(&format!("{} customers", rows.len()));
    for customer in rows {
        output::detail(&format!(
            "{:>5}  {}",
            customer.id,
            container.customers.label(customer.id)?
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn vendor_command(command: &VendorCommands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        VendorCommands::Add { name, remark } => {
            let vendor = container.catalog.add_vendor(name, remark.clone())?;
            output::success(&format!("created vendor {} ({})", vendor.name, vendor.id));
        }
        VendorCommands::List => {
            for vendor in container.catalog.vendors()? {
                output::info(&format!("{:>5}  {}", vendor.id, vendor.name));
            }
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn product_command(command: &ProductCommands, container: &ServiceContainer) -> CliResult<()> {
    let catalog = &container.catalog;
    match command {
        ProductCommands::Add {
            name,
            product_type,
            vendor,
            description,
        } => {
            let product = catalog.add_product(name, *product_type, description.clone(), *vendor)?;
            output::success(&format!("created product {} ({})", product.name, product.id));
        }
        ProductCommands::Component {
            id,
            name,
            component_type,
            description,
        } => {
            let product = catalog.add_component(*id, name, *component_type, description.clone())?;
            output::success(&format!(
                "{} has {} components",
                product.name,
                product.components.len()
            ));
        }
        ProductCommands::Model { id, name, remark } => {
            let product = catalog.add_model(*id, name, remark.clone())?;
            output::success(&format!("{} has {} models", product.name, product.models.len()));
        }
        ProductCommands::List => {
            for product in catalog.products()? {
                output::info(&format!(
                    "{:>5}  {} [{}]",
                    product.id,
                    product.name,
                    product.product_type.label()
                ));
                for model in &product.models {
                    output::detail(&format!("model: {}", model.name));
                }
            }
        }
    }
    Ok(())
}

fn config_command(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!("global: {}", path.display())),
                None => output::warning("no home directory, global config disabled"),
            }
            output::info(&format!("data:   {}", settings.data_file.display()));
        }
    }
    Ok(())
}
