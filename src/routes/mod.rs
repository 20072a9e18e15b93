mod assets;
mod categories;
mod financial_assets;
mod health_check;
mod users;

pub use assets::{create_asset, delete_asset, get_asset, list_assets, update_asset};
pub use categories::{create_category, list_categories};
pub use financial_assets::{create_financial_asset, list_financial_assets};
pub use health_check::health_check;
pub use users::{login, logout, me, refresh, signup, UserResponse};
