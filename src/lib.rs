//! Simulated "incoming ride request" screen for a ride-hailing driver.
//!
//! [`feed::OfferFeed`] shows one randomly generated [`models::Offer`] at a
//! time through a [`widget::RideOfferWidget`], and moves on to the next one
//! after the driver accepts, declines, or lets the countdown run out.

pub mod config;
pub mod countdown;
pub mod feed;
pub mod generators;
pub mod models;
pub mod render;
pub mod widget;
