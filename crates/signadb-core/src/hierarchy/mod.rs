//! Territorial hierarchy resolution.
//!
//! Geographic joins are code-based soft references, so every function here
//! resolves at query time and returns empty results for dangling codes; none
//! of these queries can fail.
//!
//! The descendant-expansion queries (`collectivities_on`) are the
//! counterpart of the counter engine's recount targets: any change to them
//! must be mirrored in `counter::counts`.

#[cfg(test)]
mod tests;

use crate::{
    db::Db,
    model::{
        code::{CodeDepartement, CodeInsee, CodeRegion},
        id::{CollectivityId, EpciId},
        office::Office,
        organization::{Collectivity, Ddfip},
        report::FormType,
        territory::{Commune, Departement, Epci, Region, TerritoryRef},
        Discardable, EntityKind,
    },
};
use std::collections::BTreeSet;

// ======================================================================
// Upward resolution
// ======================================================================

/// The EPCI a commune belongs to, through `siren_epci`. Zero or one.
#[must_use]
pub fn epci_of<'a>(db: &'a Db, commune: &Commune) -> Option<&'a Epci> {
    let siren = commune.siren_epci.as_ref()?;
    db.epcis().find(|epci| epci.siren == *siren)
}

/// The departement a commune belongs to, through `code_departement`.
/// Exactly one in well-formed data; `None` for a dangling code.
#[must_use]
pub fn departement_of<'a>(db: &'a Db, commune: &Commune) -> Option<&'a Departement> {
    departement_by_code(db, &commune.code_departement)
}

/// The region a commune belongs to, through the departement chain.
#[must_use]
pub fn region_of<'a>(db: &'a Db, commune: &Commune) -> Option<&'a Region> {
    region_of_departement(db, departement_of(db, commune)?)
}

#[must_use]
pub fn region_of_departement<'a>(db: &'a Db, departement: &Departement) -> Option<&'a Region> {
    db.regions()
        .find(|region| region.code_region == departement.code_region)
}

#[must_use]
pub fn departement_by_code<'a>(db: &'a Db, code: &CodeDepartement) -> Option<&'a Departement> {
    db.departements()
        .find(|dep| dep.code_departement == *code)
}

#[must_use]
pub fn commune_by_code<'a>(db: &'a Db, code: &CodeInsee) -> Option<&'a Commune> {
    db.communes().find(|commune| commune.code_insee == *code)
}

/// Departements an EPCI spans, computed transitively through its member
/// communes. The stored `code_departement` on the EPCI row is display-only.
#[must_use]
pub fn departements_of_epci<'a>(db: &'a Db, epci: &Epci) -> Vec<&'a Departement> {
    let codes: BTreeSet<&CodeDepartement> = communes_of_epci(db, epci)
        .into_iter()
        .map(|commune| &commune.code_departement)
        .collect();

    codes
        .into_iter()
        .filter_map(|code| departement_by_code(db, code))
        .collect()
}

/// Regions an EPCI spans, transitively through communes and departements.
#[must_use]
pub fn regions_of_epci<'a>(db: &'a Db, epci: &Epci) -> Vec<&'a Region> {
    let codes: BTreeSet<&CodeRegion> = departements_of_epci(db, epci)
        .into_iter()
        .map(|dep| &dep.code_region)
        .collect();

    codes
        .into_iter()
        .filter_map(|code| db.regions().find(|region| region.code_region == *code))
        .collect()
}

// ======================================================================
// Downward resolution
// ======================================================================

#[must_use]
pub fn communes_of_epci<'a>(db: &'a Db, epci: &Epci) -> Vec<&'a Commune> {
    db.communes()
        .iter()
        .filter(|commune| commune.siren_epci.as_ref() == Some(&epci.siren))
        .collect()
}

#[must_use]
pub fn communes_of_departement<'a>(db: &'a Db, departement: &Departement) -> Vec<&'a Commune> {
    db.communes()
        .iter()
        .filter(|commune| commune.code_departement == departement.code_departement)
        .collect()
}

#[must_use]
pub fn departements_of_region<'a>(db: &'a Db, region: &Region) -> Vec<&'a Departement> {
    db.departements()
        .iter()
        .filter(|dep| dep.code_region == region.code_region)
        .collect()
}

#[must_use]
pub fn communes_of_region<'a>(db: &'a Db, region: &Region) -> Vec<&'a Commune> {
    departements_of_region(db, region)
        .into_iter()
        .flat_map(|dep| communes_of_departement(db, dep))
        .collect()
}

/// Distinct EPCIs having at least one member commune in the departement.
#[must_use]
pub fn epcis_of_departement<'a>(db: &'a Db, departement: &Departement) -> Vec<&'a Epci> {
    epcis_of_communes(db, communes_of_departement(db, departement))
}

/// Distinct EPCIs having at least one member commune in the region.
#[must_use]
pub fn epcis_of_region<'a>(db: &'a Db, region: &Region) -> Vec<&'a Epci> {
    epcis_of_communes(db, communes_of_region(db, region))
}

fn epcis_of_communes<'a>(db: &'a Db, communes: Vec<&Commune>) -> Vec<&'a Epci> {
    // DISTINCT: an EPCI spanning several communes counts once.
    let mut seen: BTreeSet<EpciId> = BTreeSet::new();
    let mut out = Vec::new();

    for commune in communes {
        if let Some(epci) = epci_of(db, commune) {
            if seen.insert(epci.id) {
                out.push(epci);
            }
        }
    }

    out
}

#[must_use]
pub fn ddfips_of_departement<'a>(db: &'a Db, departement: &Departement) -> Vec<&'a Ddfip> {
    db.ddfips()
        .iter_live()
        .filter(|ddfip| ddfip.code_departement == departement.code_departement)
        .collect()
}

#[must_use]
pub fn ddfips_of_region<'a>(db: &'a Db, region: &Region) -> Vec<&'a Ddfip> {
    departements_of_region(db, region)
        .into_iter()
        .flat_map(|dep| ddfips_of_departement(db, dep))
        .collect()
}

/// The live DDFIP whose departement covers the given commune code, resolved
/// through commune → departement. Used to route a report at transmit time.
#[must_use]
pub fn ddfip_covering<'a>(db: &'a Db, code_insee: &CodeInsee) -> Option<&'a Ddfip> {
    let commune = commune_by_code(db, code_insee)?;
    db.ddfips()
        .iter_live()
        .find(|ddfip| ddfip.code_departement == commune.code_departement)
}

/// Live offices whose commune join covers the code and whose competences
/// include the form type.
#[must_use]
pub fn offices_covering<'a>(db: &'a Db, code_insee: &CodeInsee, form_type: FormType) -> Vec<&'a Office> {
    db.office_communes()
        .iter()
        .filter(|join| join.code_insee == *code_insee)
        .filter_map(|join| db.offices().get(&join.office_id))
        .filter(|office| !office.is_discarded() && office.covers(form_type))
        .collect()
}

// ======================================================================
// Collectivity expansion
// ======================================================================

/// Live collectivities registered on the territory itself or on any of its
/// descendant territories. A region's collectivities include those on the
/// region, on its departements, on the communes of those departements, and
/// on any EPCI whose member communes lie within them.
#[must_use]
pub fn collectivities_on<'a>(db: &'a Db, territory: TerritoryRef) -> Vec<&'a Collectivity> {
    let targets = territory_and_descendants(db, territory);

    let mut seen: BTreeSet<CollectivityId> = BTreeSet::new();
    let mut out = Vec::new();

    for collectivity in db.collectivities().iter_live() {
        if targets.contains(&collectivity.territory) && seen.insert(collectivity.id()) {
            out.push(collectivity);
        }
    }

    out
}

/// The territory itself plus every descendant territory reference.
#[must_use]
pub fn territory_and_descendants(db: &Db, territory: TerritoryRef) -> BTreeSet<TerritoryRef> {
    let mut out = BTreeSet::from([territory]);

    match territory {
        TerritoryRef::Commune(_) => {}
        TerritoryRef::Epci(id) => {
            if let Some(epci) = db.epcis().get(&id) {
                for commune in communes_of_epci(db, epci) {
                    out.insert(TerritoryRef::Commune(commune.id));
                }
            }
        }
        TerritoryRef::Departement(id) => {
            if let Some(departement) = db.departements().get(&id) {
                expand_departement(db, departement, &mut out);
            }
        }
        TerritoryRef::Region(id) => {
            if let Some(region) = db.regions().get(&id) {
                for departement in departements_of_region(db, region) {
                    out.insert(TerritoryRef::Departement(departement.id));
                    expand_departement(db, departement, &mut out);
                }
            }
        }
    }

    out
}

fn expand_departement(db: &Db, departement: &Departement, out: &mut BTreeSet<TerritoryRef>) {
    for commune in communes_of_departement(db, departement) {
        out.insert(TerritoryRef::Commune(commune.id));
    }
    for epci in epcis_of_departement(db, departement) {
        out.insert(TerritoryRef::Epci(epci.id));
    }
}
