//! Input normalization applied before validation, so that uniqueness checks
//! and code joins compare canonical forms.

use crate::model::{
    office::Office,
    organization::{Collectivity, Ddfip, Dgfip, Publisher},
    package::Package,
    report::Report,
    territory::{Commune, Departement, Epci, Region},
    user::User,
};

fn squish(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

pub(crate) fn commune(row: &mut Commune) {
    squish(&mut row.name);
}

pub(crate) fn epci(row: &mut Epci) {
    squish(&mut row.name);
}

pub(crate) fn departement(row: &mut Departement) {
    squish(&mut row.name);
}

pub(crate) fn region(row: &mut Region) {
    squish(&mut row.name);
}

pub(crate) fn collectivity(row: &mut Collectivity) {
    squish(&mut row.name);
}

pub(crate) fn publisher(row: &mut Publisher) {
    squish(&mut row.name);
}

pub(crate) fn ddfip(row: &mut Ddfip) {
    squish(&mut row.name);
}

pub(crate) fn dgfip(row: &mut Dgfip) {
    squish(&mut row.name);
}

pub(crate) fn user(row: &mut User) {
    squish(&mut row.name);
    squish(&mut row.email);
    row.email = row.email.to_lowercase();
}

pub(crate) fn office(row: &mut Office) {
    squish(&mut row.name);
}

pub(crate) fn package(row: &mut Package) {
    squish(&mut row.reference);
}

pub(crate) fn report(row: &mut Report) {
    row.refresh_sibling_id();
}
