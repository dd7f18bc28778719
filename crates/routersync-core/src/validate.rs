//! IP / CIDR format checks for configuration payloads.
//!
//! Each check returns a `SyncError::Validation` with a message specific to the
//! field, so the caller can show it as-is.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, SyncError};

const OCTET: &str = r"(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)";

lazy_static! {
    static ref IPV4: Regex = Regex::new(&format!(r"^{o}\.{o}\.{o}\.{o}$", o = OCTET))
        .expect("ipv4 pattern");

    static ref IPV4_CIDR: Regex = Regex::new(&format!(
        r"^{o}\.{o}\.{o}\.{o}/(3[0-2]|[12]?\d)$",
        o = OCTET
    ))
    .expect("cidr pattern");

    static ref IPV4_RANGE: Regex = Regex::new(&format!(
        r"^{o}\.{o}\.{o}\.{o}-{o}\.{o}\.{o}\.{o}$",
        o = OCTET
    ))
    .expect("range pattern");
}

pub fn is_ipv4(value: &str) -> bool {
    IPV4.is_match(value)
}

pub fn is_cidr(value: &str) -> bool {
    IPV4_CIDR.is_match(value)
}

/// Address or CIDR, as accepted for firewall and queue targets
pub fn is_address_or_cidr(value: &str) -> bool {
    is_ipv4(value) || is_cidr(value)
}

/// `a.b.c.d-e.f.g.h`, CIDR, or a comma-separated list of either
pub fn is_ip_range(value: &str) -> bool {
    split_list(value).is_some_and(|items| {
        items
            .iter()
            .all(|item| IPV4_RANGE.is_match(item) || IPV4_CIDR.is_match(item))
    })
}

/// Comma-separated IPv4 addresses
pub fn is_dns_servers(value: &str) -> bool {
    split_list(value).is_some_and(|items| items.iter().all(|item| IPV4.is_match(item)))
}

fn split_list(value: &str) -> Option<Vec<&str>> {
    let items: Vec<&str> = value.split(',').map(str::trim).collect();
    if items.iter().any(|item| item.is_empty()) {
        None
    } else {
        Some(items)
    }
}

pub fn check_ip_range(field: &str, value: &str) -> Result<()> {
    if is_ip_range(value) {
        Ok(())
    } else {
        Err(SyncError::Validation(format!(
            "Invalid {} format. Use start-end (e.g. 192.168.1.10-192.168.1.100) or CIDR (e.g. 192.168.1.0/24)",
            field
        )))
    }
}

pub fn check_dns_servers(field: &str, value: &str) -> Result<()> {
    if is_dns_servers(value) {
        Ok(())
    } else {
        Err(SyncError::Validation(format!(
            "Invalid {} format. Use comma-separated IPv4 addresses (e.g. 8.8.8.8,1.1.1.1)",
            field
        )))
    }
}

pub fn check_cidr(field: &str, value: &str) -> Result<()> {
    if is_cidr(value) {
        Ok(())
    } else {
        Err(SyncError::Validation(format!(
            "Invalid {} format. Use CIDR notation (e.g. 192.168.1.0/24)",
            field
        )))
    }
}

pub fn check_ipv4(field: &str, value: &str) -> Result<()> {
    if is_ipv4(value) {
        Ok(())
    } else {
        Err(SyncError::Validation(format!(
            "Invalid {} format. Use an IPv4 address (e.g. 192.168.1.1)",
            field
        )))
    }
}

pub fn check_address_or_cidr(field: &str, value: &str) -> Result<()> {
    if is_address_or_cidr(value) {
        Ok(())
    } else {
        Err(SyncError::Validation(format!(
            "Invalid {} format. Use an IPv4 address or CIDR (e.g. 10.0.0.5 or 10.0.0.0/24)",
            field
        )))
    }
}

/// Non-empty required text field
pub fn check_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(SyncError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}
