//! Derive macros for Courier request types.
//!
//! - `#[derive(Command)]` with an optional `#[command(output = T)]`
//! - `#[derive(Query)]` with an optional `#[query(output = T)]`
//! - `#[derive(Event)]`
//!
//! The generated code refers to `::courier::__private`, a hidden re-export of
//! `courier-core`, so a crate depending on `courier` alone can derive.
//!
//! ```rust,ignore
//! use courier::{Command, Event, Query};
//!
//! #[derive(Debug, Command)]
//! #[command(output = i64)]
//! struct CreateUser {
//!     user_id: i64,
//!     username: String,
//! }
//!
//! #[derive(Debug, Query)]
//! #[query(output = Option<User>)]
//! struct GetUserById {
//!     user_id: i64,
//! }
//!
//! #[derive(Debug, Clone, Event)]
//! struct UserCreated {
//!     user_id: i64,
//! }
//! ```

mod request;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

use request::Family;

fn expand(input: TokenStream, family: Family) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match request::derive_request(&input, family) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Makes a type a command.
///
/// `#[command(output = T)]` sets the handler's return type (default `()`).
#[proc_macro_derive(Command, attributes(command))]
pub fn derive_command(input: TokenStream) -> TokenStream {
    expand(input, Family::Command)
}

/// Makes a type a query.
///
/// `#[query(output = T)]` sets the handler's return type (default `()`).
#[proc_macro_derive(Query, attributes(query))]
pub fn derive_query(input: TokenStream) -> TokenStream {
    expand(input, Family::Query)
}

/// Makes a type an event. The type must also implement `Clone`.
#[proc_macro_derive(Event)]
pub fn derive_event(input: TokenStream) -> TokenStream {
    expand(input, Family::Event)
}
