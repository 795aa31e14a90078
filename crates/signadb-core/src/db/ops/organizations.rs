use crate::{
    counter,
    db::{validate, write, Db},
    error::InternalError,
    model::{
        id::{CollectivityId, DdfipId, DgfipId, PublisherId},
        organization::{Collectivity, Ddfip, Dgfip, Publisher},
        Discardable, EntityKind,
    },
    obs::sink::MutationKind,
    sanitize,
};
use chrono::Utc;

/// Organization mutations. Organizations are soft-deleted: `discard` stamps
/// `discarded_at` and drains the row's counter contributions, `undiscard`
/// restores both. Discarding an already-discarded row is a no-op success.
impl Db {
    // ======================================================================
    // Collectivities
    // ======================================================================

    pub fn insert_collectivity(
        &mut self,
        mut row: Collectivity,
    ) -> Result<CollectivityId, InternalError> {
        sanitize::collectivity(&mut row);
        validate::collectivity(self, &row)?;
        if self.collectivities.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "collectivities: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = counter::collectivities::plan(self, None, Some(&row));
        write::commit(self, Collectivity::NAME, MutationKind::Insert, ops, |db| {
            db.collectivities.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_collectivity(&mut self, mut row: Collectivity) -> Result<(), InternalError> {
        let old = self
            .collectivities
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("collectivities: {}", row.id)))?;

        sanitize::collectivity(&mut row);
        validate::collectivity(self, &row)?;

        row.discarded_at = old.discarded_at;
        row.users_count = old.users_count;
        row.reports_transmitted_count = old.reports_transmitted_count;
        row.reports_approved_count = old.reports_approved_count;
        row.reports_rejected_count = old.reports_rejected_count;
        row.packages_transmitted_count = old.packages_transmitted_count;

        let ops = counter::collectivities::plan(self, Some(&old), Some(&row));
        write::commit(self, Collectivity::NAME, MutationKind::Update, ops, |db| {
            db.collectivities.insert(row);
        })
    }

    pub fn discard_collectivity(&mut self, id: CollectivityId) -> Result<(), InternalError> {
        let old = self
            .collectivities
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("collectivities: {id}")))?;

        if old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(Some(Utc::now()));

        let ops = counter::collectivities::plan(self, Some(&old), Some(&new));
        write::commit(self, Collectivity::NAME, MutationKind::Discard, ops, |db| {
            db.collectivities.insert(new);
        })
    }

    pub fn undiscard_collectivity(&mut self, id: CollectivityId) -> Result<(), InternalError> {
        let old = self
            .collectivities
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("collectivities: {id}")))?;

        if !old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(None);
        validate::collectivity(self, &new)?;

        let ops = counter::collectivities::plan(self, Some(&old), Some(&new));
        write::commit(self, Collectivity::NAME, MutationKind::Undiscard, ops, |db| {
            db.collectivities.insert(new);
        })
    }

    pub fn delete_collectivity(&mut self, id: CollectivityId) -> Result<(), InternalError> {
        let old = self
            .collectivities
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("collectivities: {id}")))?;

        let ops = counter::collectivities::plan(self, Some(&old), None);
        write::commit(self, Collectivity::NAME, MutationKind::Delete, ops, |db| {
            db.collectivities.remove(&id);
        })
    }

    // ======================================================================
    // Publishers
    // ======================================================================

    pub fn insert_publisher(&mut self, mut row: Publisher) -> Result<PublisherId, InternalError> {
        sanitize::publisher(&mut row);
        validate::publisher(self, &row)?;
        if self.publishers.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "publishers: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        write::commit(self, Publisher::NAME, MutationKind::Insert, Vec::new(), |db| {
            db.publishers.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_publisher(&mut self, mut row: Publisher) -> Result<(), InternalError> {
        let old = self
            .publishers
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("publishers: {}", row.id)))?;

        sanitize::publisher(&mut row);
        validate::publisher(self, &row)?;

        row.discarded_at = old.discarded_at;
        row.users_count = old.users_count;
        row.collectivities_count = old.collectivities_count;
        row.reports_transmitted_count = old.reports_transmitted_count;
        row.reports_approved_count = old.reports_approved_count;
        row.reports_rejected_count = old.reports_rejected_count;

        write::commit(self, Publisher::NAME, MutationKind::Update, Vec::new(), |db| {
            db.publishers.insert(row);
        })
    }

    pub fn discard_publisher(&mut self, id: PublisherId) -> Result<(), InternalError> {
        let old = self
            .publishers
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("publishers: {id}")))?;

        if old.is_discarded() {
            return Ok(());
        }

        let mut new = old;
        new.set_discarded_at(Some(Utc::now()));

        write::commit(self, Publisher::NAME, MutationKind::Discard, Vec::new(), |db| {
            db.publishers.insert(new);
        })
    }

    pub fn undiscard_publisher(&mut self, id: PublisherId) -> Result<(), InternalError> {
        let old = self
            .publishers
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("publishers: {id}")))?;

        if !old.is_discarded() {
            return Ok(());
        }

        let mut new = old;
        new.set_discarded_at(None);
        validate::publisher(self, &new)?;

        write::commit(self, Publisher::NAME, MutationKind::Undiscard, Vec::new(), |db| {
            db.publishers.insert(new);
        })
    }

    pub fn delete_publisher(&mut self, id: PublisherId) -> Result<(), InternalError> {
        if !self.publishers.contains(&id) {
            return Err(InternalError::store_not_found(format!("publishers: {id}")));
        }

        write::commit(self, Publisher::NAME, MutationKind::Delete, Vec::new(), |db| {
            db.publishers.remove(&id);
        })
    }

    // ======================================================================
    // DDFIPs
    // ======================================================================

    pub fn insert_ddfip(&mut self, mut row: Ddfip) -> Result<DdfipId, InternalError> {
        sanitize::ddfip(&mut row);
        validate::ddfip(self, &row)?;
        if self.ddfips.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "ddfips: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = counter::ddfips::plan(self, None, Some(&row));
        write::commit(self, Ddfip::NAME, MutationKind::Insert, ops, |db| {
            db.ddfips.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_ddfip(&mut self, mut row: Ddfip) -> Result<(), InternalError> {
        let old = self
            .ddfips
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("ddfips: {}", row.id)))?;

        sanitize::ddfip(&mut row);
        validate::ddfip(self, &row)?;

        row.discarded_at = old.discarded_at;
        row.users_count = old.users_count;
        row.collectivities_count = old.collectivities_count;
        row.offices_count = old.offices_count;
        row.reports_count = old.reports_count;
        row.reports_approved_count = old.reports_approved_count;
        row.reports_rejected_count = old.reports_rejected_count;

        let ops = counter::ddfips::plan(self, Some(&old), Some(&row));
        write::commit(self, Ddfip::NAME, MutationKind::Update, ops, |db| {
            db.ddfips.insert(row);
        })
    }

    pub fn discard_ddfip(&mut self, id: DdfipId) -> Result<(), InternalError> {
        let old = self
            .ddfips
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("ddfips: {id}")))?;

        if old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(Some(Utc::now()));

        let ops = counter::ddfips::plan(self, Some(&old), Some(&new));
        write::commit(self, Ddfip::NAME, MutationKind::Discard, ops, |db| {
            db.ddfips.insert(new);
        })
    }

    pub fn undiscard_ddfip(&mut self, id: DdfipId) -> Result<(), InternalError> {
        let old = self
            .ddfips
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("ddfips: {id}")))?;

        if !old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(None);
        validate::ddfip(self, &new)?;

        let ops = counter::ddfips::plan(self, Some(&old), Some(&new));
        write::commit(self, Ddfip::NAME, MutationKind::Undiscard, ops, |db| {
            db.ddfips.insert(new);
        })
    }

    pub fn delete_ddfip(&mut self, id: DdfipId) -> Result<(), InternalError> {
        let old = self
            .ddfips
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("ddfips: {id}")))?;

        let ops = counter::ddfips::plan(self, Some(&old), None);
        write::commit(self, Ddfip::NAME, MutationKind::Delete, ops, |db| {
            db.ddfips.remove(&id);
        })
    }

    // ======================================================================
    // DGFIP
    // ======================================================================

    pub fn insert_dgfip(&mut self, mut row: Dgfip) -> Result<DgfipId, InternalError> {
        sanitize::dgfip(&mut row);
        validate::dgfip(self, &row)?;
        if self.dgfips.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "dgfips: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        write::commit(self, Dgfip::NAME, MutationKind::Insert, Vec::new(), |db| {
            db.dgfips.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_dgfip(&mut self, mut row: Dgfip) -> Result<(), InternalError> {
        let old = self
            .dgfips
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("dgfips: {}", row.id)))?;

        sanitize::dgfip(&mut row);
        validate::dgfip(self, &row)?;

        row.discarded_at = old.discarded_at;
        row.users_count = old.users_count;
        row.reports_transmitted_count = old.reports_transmitted_count;
        row.reports_approved_count = old.reports_approved_count;
        row.reports_rejected_count = old.reports_rejected_count;

        write::commit(self, Dgfip::NAME, MutationKind::Update, Vec::new(), |db| {
            db.dgfips.insert(row);
        })
    }

    pub fn discard_dgfip(&mut self, id: DgfipId) -> Result<(), InternalError> {
        let old = self
            .dgfips
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("dgfips: {id}")))?;

        if old.is_discarded() {
            return Ok(());
        }

        let mut new = old;
        new.set_discarded_at(Some(Utc::now()));

        write::commit(self, Dgfip::NAME, MutationKind::Discard, Vec::new(), |db| {
            db.dgfips.insert(new);
        })
    }

    /// Fails while another live DGFIP row exists; the singleton rule applies
    /// on the way back in, not only on insert.
    pub fn undiscard_dgfip(&mut self, id: DgfipId) -> Result<(), InternalError> {
        let old = self
            .dgfips
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("dgfips: {id}")))?;

        if !old.is_discarded() {
            return Ok(());
        }

        let mut new = old;
        new.set_discarded_at(None);
        validate::dgfip(self, &new)?;

        // Report tallies were frozen while the row was discarded; re-derive
        // them now that the row is live again.
        let ops = vec![
            counter::CounterOp::recount(counter::CounterSlot::DgfipReportsTransmitted(id)),
            counter::CounterOp::recount(counter::CounterSlot::DgfipReportsApproved(id)),
            counter::CounterOp::recount(counter::CounterSlot::DgfipReportsRejected(id)),
        ];
        write::commit(self, Dgfip::NAME, MutationKind::Undiscard, ops, |db| {
            db.dgfips.insert(new);
        })
    }

    pub fn delete_dgfip(&mut self, id: DgfipId) -> Result<(), InternalError> {
        if !self.dgfips.contains(&id) {
            return Err(InternalError::store_not_found(format!("dgfips: {id}")));
        }

        write::commit(self, Dgfip::NAME, MutationKind::Delete, Vec::new(), |db| {
            db.dgfips.remove(&id);
        })
    }
}
