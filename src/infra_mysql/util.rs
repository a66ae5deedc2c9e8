use super::repo_tx_mysql::MySqlTx;
use crate::domain_port::*;
use anyhow::anyhow;
use sqlx::mysql::MySqlDatabaseError;

pub fn downcast(tx: &mut dyn StorageTx) -> anyhow::Result<&mut MySqlTx> {
    tx.as_any_mut()
        .downcast_mut::<MySqlTx>()
        .ok_or_else(|| anyhow!("transaction was not opened by the mysql backend"))
}

fn error_number(err: &sqlx::Error) -> Option<u16> {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return Some(mysql_err.number());
        }
    }

    None
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    error_number(err) == Some(1062) // ER_DUP_ENTRY
}

pub fn is_fk_violation(err: &sqlx::Error) -> bool {
    error_number(err) == Some(1452) // ER_NO_REFERENCED_ROW_2
}

/// Builds a `LIKE` pattern matching values that start with `prefix` literally.
pub fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
