use crate::{
    counter::territories as plans,
    db::{validate, write, Db},
    error::InternalError,
    model::{
        id::{CommuneId, DepartementId, EpciId, RegionId},
        territory::{Commune, Departement, Epci, Region},
        EntityKind,
    },
    obs::sink::MutationKind,
    sanitize,
};

/// Territory mutations. Territories are hard-deleted, never discarded.
impl Db {
    // ======================================================================
    // Communes
    // ======================================================================

    pub fn insert_commune(&mut self, mut row: Commune) -> Result<CommuneId, InternalError> {
        sanitize::commune(&mut row);
        validate::commune(self, &row)?;
        if self.communes.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "communes: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = plans::commune_plan(self, None, Some(&row));
        write::commit(self, Commune::NAME, MutationKind::Insert, ops, |db| {
            db.communes.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_commune(&mut self, mut row: Commune) -> Result<(), InternalError> {
        let old = self
            .communes
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("communes: {}", row.id)))?;

        sanitize::commune(&mut row);
        validate::commune(self, &row)?;

        // Counter columns are engine-owned; carry them over from the stored
        // row so callers can't clobber them.
        row.collectivities_count = old.collectivities_count;
        row.offices_count = old.offices_count;

        let ops = plans::commune_plan(self, Some(&old), Some(&row));
        write::commit(self, Commune::NAME, MutationKind::Update, ops, |db| {
            db.communes.insert(row);
        })
    }

    pub fn delete_commune(&mut self, id: CommuneId) -> Result<(), InternalError> {
        let old = self
            .communes
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("communes: {id}")))?;

        let ops = plans::commune_plan(self, Some(&old), None);
        write::commit(self, Commune::NAME, MutationKind::Delete, ops, |db| {
            db.communes.remove(&id);
        })
    }

    // ======================================================================
    // EPCIs
    // ======================================================================

    pub fn insert_epci(&mut self, mut row: Epci) -> Result<EpciId, InternalError> {
        sanitize::epci(&mut row);
        validate::epci(self, &row)?;
        if self.epcis.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "epcis: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = plans::epci_plan(self, None, Some(&row));
        write::commit(self, Epci::NAME, MutationKind::Insert, ops, |db| {
            db.epcis.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_epci(&mut self, mut row: Epci) -> Result<(), InternalError> {
        let old = self
            .epcis
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("epcis: {}", row.id)))?;

        sanitize::epci(&mut row);
        validate::epci(self, &row)?;

        row.communes_count = old.communes_count;
        row.collectivities_count = old.collectivities_count;

        let ops = plans::epci_plan(self, Some(&old), Some(&row));
        write::commit(self, Epci::NAME, MutationKind::Update, ops, |db| {
            db.epcis.insert(row);
        })
    }

    pub fn delete_epci(&mut self, id: EpciId) -> Result<(), InternalError> {
        let old = self
            .epcis
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("epcis: {id}")))?;

        let ops = plans::epci_plan(self, Some(&old), None);
        write::commit(self, Epci::NAME, MutationKind::Delete, ops, |db| {
            db.epcis.remove(&id);
        })
    }

    // ======================================================================
    // Departements
    // ======================================================================

    pub fn insert_departement(&mut self, mut row: Departement) -> Result<DepartementId, InternalError> {
        sanitize::departement(&mut row);
        validate::departement(self, &row)?;
        if self.departements.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "departements: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = plans::departement_plan(self, None, Some(&row));
        write::commit(self, Departement::NAME, MutationKind::Insert, ops, |db| {
            db.departements.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_departement(&mut self, mut row: Departement) -> Result<(), InternalError> {
        let old = self
            .departements
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("departements: {}", row.id)))?;

        sanitize::departement(&mut row);
        validate::departement(self, &row)?;

        row.communes_count = old.communes_count;
        row.epcis_count = old.epcis_count;
        row.ddfips_count = old.ddfips_count;
        row.collectivities_count = old.collectivities_count;

        let ops = plans::departement_plan(self, Some(&old), Some(&row));
        write::commit(self, Departement::NAME, MutationKind::Update, ops, |db| {
            db.departements.insert(row);
        })
    }

    pub fn delete_departement(&mut self, id: DepartementId) -> Result<(), InternalError> {
        let old = self
            .departements
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("departements: {id}")))?;

        let ops = plans::departement_plan(self, Some(&old), None);
        write::commit(self, Departement::NAME, MutationKind::Delete, ops, |db| {
            db.departements.remove(&id);
        })
    }

    // ======================================================================
    // Regions
    // ======================================================================

    pub fn insert_region(&mut self, mut row: Region) -> Result<RegionId, InternalError> {
        sanitize::region(&mut row);
        validate::region(self, &row)?;
        if self.regions.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "regions: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = plans::region_plan(self, None, Some(&row));
        write::commit(self, Region::NAME, MutationKind::Insert, ops, |db| {
            db.regions.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_region(&mut self, mut row: Region) -> Result<(), InternalError> {
        let old = self
            .regions
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("regions: {}", row.id)))?;

        sanitize::region(&mut row);
        validate::region(self, &row)?;

        row.departements_count = old.departements_count;
        row.communes_count = old.communes_count;
        row.epcis_count = old.epcis_count;
        row.ddfips_count = old.ddfips_count;
        row.collectivities_count = old.collectivities_count;

        let ops = plans::region_plan(self, Some(&old), Some(&row));
        write::commit(self, Region::NAME, MutationKind::Update, ops, |db| {
            db.regions.insert(row);
        })
    }

    pub fn delete_region(&mut self, id: RegionId) -> Result<(), InternalError> {
        let old = self
            .regions
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("regions: {id}")))?;

        let ops = plans::region_plan(self, Some(&old), None);
        write::commit(self, Region::NAME, MutationKind::Delete, ops, |db| {
            db.regions.remove(&id);
        })
    }
}
