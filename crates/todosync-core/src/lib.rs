// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the todosync client.
//!
//! This crate holds the data model, the error taxonomy, and the adapter
//! traits through which the controller reaches the authentication provider
//! and the remote record store.

pub mod error;
pub mod traits;
pub mod types;

pub use error::TodoError;
pub use types::{
    AdapterType, AuthState, CompletionFilter, Credentials, HealthStatus, NewTodo, ResultPage,
    Session, SortOrder, Todo, TodoId, TodoMatch, TodoPatch, TodoQuery, UserId,
};

pub use traits::{AuthAdapter, PluginAdapter, TodoStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::Auth, AdapterType::Store] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).expect("should parse back"), variant);
        }
    }

    #[test]
    fn sort_order_uses_column_names() {
        use std::str::FromStr;

        assert_eq!(SortOrder::from_str("id").unwrap(), SortOrder::IdDesc);
        assert_eq!(SortOrder::CreatedAtDesc.to_string(), "created_at");
        let json = serde_json::to_string(&SortOrder::IdDesc).unwrap();
        assert_eq!(json, "\"id\"");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_auth<T: AuthAdapter>() {}
        fn _assert_store<T: TodoStore>() {}
        fn _assert_plugin<T: PluginAdapter>() {}
    }
}
