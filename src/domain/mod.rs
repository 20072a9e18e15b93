/// Persistence layer
///
/// Row types and Postgres queries for each resource. Handlers call these
/// functions with the shared pool; the session core reaches users only
/// through `PgUserStore`.

pub mod asset;
pub mod category;
pub mod financial_asset;
pub mod user;

/// Substring pattern for `ILIKE $n ESCAPE '\'`; `%`, `_` and `\` in the
/// user's text match literally
pub(crate) fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
