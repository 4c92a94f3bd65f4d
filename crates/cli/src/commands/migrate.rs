use crate::commands::{with_migrated_pool, CommandResult};

pub fn run() -> CommandResult {
    with_migrated_pool("migrate", |_pool| async move {
        Ok("applied pending migrations".to_string())
    })
}
