use tracing::{debug, warn};

use crate::ddl::drop_statement;
use crate::exec::Connection;

/// Drops `table`, treating every failure (including a missing table) as
/// success. Returns whether the drop statement itself succeeded.
pub fn drop_if_exists<C: Connection + ?Sized>(conn: &mut C, table: &str) -> bool {
    match conn.execute(&drop_statement(table)) {
        Ok(()) => {
            debug!(table, "exec.drop");
            true
        }
        Err(err) => {
            warn!(table, message = %err, "exec.drop.skipped");
            false
        }
    }
}
