//! Paths and collection keys of the upstream API

/// DTE list (paged, filtered)
pub const DTES: &str = "/dtes";
/// Collection key of the DTE list
pub const DTES_KEY: &str = "dtes";

/// Estimate list (paged, filtered)
pub const ESTIMATES: &str = "/cotizaciones";
/// Collection key of the estimate list
pub const ESTIMATES_KEY: &str = "estimates";

/// Customers
pub const CUSTOMERS: &str = "/clientes";
/// Collection key of customers
pub const CUSTOMERS_KEY: &str = "customers";

/// Cities
pub const CITIES: &str = "/ciudades";
/// Collection key of cities
pub const CITIES_KEY: &str = "cities";

/// Communes
pub const COMMUNES: &str = "/comunas";
/// Collection key of communes
pub const COMMUNES_KEY: &str = "communes";

/// Sellers
pub const SELLERS: &str = "/vendedores";
/// Collection key of sellers
pub const SELLERS_KEY: &str = "sellers";

/// Payment types
pub const PAYMENT_TYPES: &str = "/forma_pagos";
/// Collection key of payment types
pub const PAYMENT_TYPES_KEY: &str = "type_payments";

/// Users
pub const USERS: &str = "/usuarios";
/// Collection key of users
pub const USERS_KEY: &str = "users";

/// Reference document codes
pub const REFERENCES: &str = "/references";
/// Collection key of reference codes
pub const REFERENCES_KEY: &str = "references";

/// `/<collection>/<id>`
pub fn detail(collection: &str, id: i64) -> String {
    format!("{collection}/{id}")
}

/// Print layout of a DTE
pub fn dte_print(id: i64) -> String {
    format!("{DTES}/{id}/imprimir")
}
