pub mod app;
pub mod catalog;
pub mod checkout;
pub mod cli;
pub mod config;
pub mod output;
pub mod proxy;
pub mod source;
pub mod storefront;
pub mod theme;

#[cfg(test)]
mod tests;
