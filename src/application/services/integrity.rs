//! Rules for customer records whose division changes or disappears.

use tracing::{debug, trace};

use crate::domain::{CustomerId, DivisionId, DomainResult};
use crate::infrastructure::traits::CustomerRepository;

/// Keeps customer references valid across division mutations.
///
/// Reorganising the geography never deletes a customer: when a division goes
/// away its customers lose their reference and stay in the table.
pub struct ReferenceGuard;

impl ReferenceGuard {
    /// Clear the division reference of every customer attached to one of
    /// `removed`. Returns the customers that were touched.
    pub fn on_delete(
        customers: &mut dyn CustomerRepository,
        removed: &[DivisionId],
    ) -> DomainResult<Vec<CustomerId>> {
        let mut cleared = Vec::new();
        for &division in removed {
            for customer in customers.list_by_division(division) {
                customers.clear_division_ref(customer.id)?;
                cleared.push(customer.id);
            }
        }
        debug!(
            "on_delete: {} divisions removed, {} customers detached",
            removed.len(),
            cleared.len()
        );
        Ok(cleared)
    }

    /// Customers follow a moved division by id; nothing to do.
    pub fn on_move(division: DivisionId) {
        trace!("on_move: division {} keeps its customers", division);
    }
}
