//! HTTP API handlers.

pub mod countries;
pub mod status;

pub(crate) use countries::{
    country_image, delete_country, get_country, list_countries, refresh_countries,
};
pub(crate) use status::{health, status};
