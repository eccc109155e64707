use telcobot_agent::{billing_registry, shared_store};
use telcobot_core::BillingMockStore;

use crate::commands::CommandResult;

/// Prints the tool definitions the model is offered.
pub fn run() -> CommandResult {
    let registry = billing_registry(shared_store(BillingMockStore::seeded()));
    CommandResult::document("tools", 0, &registry.definitions())
}
