//! Backend REST paths, relative to `Settings::api_base_url`.

pub const ACCEPTED_ASSETS: &str = "accepted-assets";

pub mod user_assets {
    pub const GET: &str = "user-assets/";
    pub const ADD: &str = "user-assets/add-asset";
    pub const EDIT_QUANTITY: &str = "user-assets/edit-asset-quantity";
    pub const EDIT_ASSET: &str = "user-assets/edit-asset";
    pub const DELETE: &str = "user-assets/delete-asset";
}

pub mod user_deposits {
    pub const GET: &str = "user-deposits/";
    pub const ADD: &str = "user-deposits/add-deposit";
    pub const EDIT_AMOUNT: &str = "user-deposits/edit-deposit-amount";
    pub const EDIT_DEPOSIT: &str = "user-deposits/edit-deposit";
    pub const DELETE: &str = "user-deposits/delete-deposit";
}

/// Join a relative path onto the base URL with exactly one slash between.
pub fn join(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
