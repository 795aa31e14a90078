use crate::{
    counter,
    db::{validate, write, Db},
    error::InternalError,
    model::{
        id::{OfficeCommuneId, OfficeId, OfficeUserId, PackageId, ReportId, TransmissionId, UserId},
        office::{Office, OfficeCommune, OfficeUser},
        package::Package,
        report::{Report, ReportState},
        transmission::Transmission,
        user::User,
        Discardable, EntityKind,
    },
    obs::sink::MutationKind,
    sanitize,
};
use chrono::Utc;

/// Users, offices, and the workflow entities (reports, packages,
/// transmissions).
impl Db {
    // ======================================================================
    // Users
    // ======================================================================

    pub fn insert_user(&mut self, mut row: User) -> Result<UserId, InternalError> {
        sanitize::user(&mut row);
        validate::user(self, &row)?;
        if self.users.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "users: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = counter::users::plan(self, None, Some(&row));
        write::commit(self, User::NAME, MutationKind::Insert, ops, |db| {
            db.users.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_user(&mut self, mut row: User) -> Result<(), InternalError> {
        let old = self
            .users
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("users: {}", row.id)))?;

        sanitize::user(&mut row);
        validate::user(self, &row)?;

        row.discarded_at = old.discarded_at;

        let ops = counter::users::plan(self, Some(&old), Some(&row));
        write::commit(self, User::NAME, MutationKind::Update, ops, |db| {
            db.users.insert(row);
        })
    }

    pub fn discard_user(&mut self, id: UserId) -> Result<(), InternalError> {
        let old = self
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("users: {id}")))?;

        if old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(Some(Utc::now()));

        let ops = counter::users::plan(self, Some(&old), Some(&new));
        write::commit(self, User::NAME, MutationKind::Discard, ops, |db| {
            db.users.insert(new);
        })
    }

    pub fn undiscard_user(&mut self, id: UserId) -> Result<(), InternalError> {
        let old = self
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("users: {id}")))?;

        if !old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(None);
        validate::user(self, &new)?;

        let ops = counter::users::plan(self, Some(&old), Some(&new));
        write::commit(self, User::NAME, MutationKind::Undiscard, ops, |db| {
            db.users.insert(new);
        })
    }

    pub fn delete_user(&mut self, id: UserId) -> Result<(), InternalError> {
        let old = self
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("users: {id}")))?;

        // Membership joins go with the user; their counter effect is already
        // covered by the user plan's office recounts.
        let joins: Vec<OfficeUserId> = self
            .office_users
            .iter()
            .filter(|j| j.user_id == id)
            .map(|j| j.id)
            .collect();

        let ops = counter::users::plan(self, Some(&old), None);
        write::commit(self, User::NAME, MutationKind::Delete, ops, |db| {
            for join_id in joins {
                db.office_users.remove(&join_id);
            }
            db.users.remove(&id);
        })
    }

    // ======================================================================
    // Offices
    // ======================================================================

    pub fn insert_office(&mut self, mut row: Office) -> Result<OfficeId, InternalError> {
        sanitize::office(&mut row);
        validate::office(self, &row)?;
        if self.offices.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "offices: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = counter::offices::office_plan(self, None, Some(&row));
        write::commit(self, Office::NAME, MutationKind::Insert, ops, |db| {
            db.offices.insert(row);
        })?;

        Ok(id)
    }

    pub fn update_office(&mut self, mut row: Office) -> Result<(), InternalError> {
        let old = self
            .offices
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("offices: {}", row.id)))?;

        sanitize::office(&mut row);
        validate::office(self, &row)?;

        row.discarded_at = old.discarded_at;
        row.communes_count = old.communes_count;
        row.users_count = old.users_count;
        row.reports_assigned_count = old.reports_assigned_count;
        row.reports_approved_count = old.reports_approved_count;
        row.reports_rejected_count = old.reports_rejected_count;

        let ops = counter::offices::office_plan(self, Some(&old), Some(&row));
        write::commit(self, Office::NAME, MutationKind::Update, ops, |db| {
            db.offices.insert(row);
        })
    }

    pub fn discard_office(&mut self, id: OfficeId) -> Result<(), InternalError> {
        let old = self
            .offices
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("offices: {id}")))?;

        if old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(Some(Utc::now()));

        let ops = counter::offices::office_plan(self, Some(&old), Some(&new));
        write::commit(self, Office::NAME, MutationKind::Discard, ops, |db| {
            db.offices.insert(new);
        })
    }

    pub fn undiscard_office(&mut self, id: OfficeId) -> Result<(), InternalError> {
        let old = self
            .offices
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("offices: {id}")))?;

        if !old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(None);

        let ops = counter::offices::office_plan(self, Some(&old), Some(&new));
        write::commit(self, Office::NAME, MutationKind::Undiscard, ops, |db| {
            db.offices.insert(new);
        })
    }

    pub fn delete_office(&mut self, id: OfficeId) -> Result<(), InternalError> {
        let old = self
            .offices
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("offices: {id}")))?;

        let commune_joins: Vec<OfficeCommuneId> = self
            .office_communes
            .iter()
            .filter(|j| j.office_id == id)
            .map(|j| j.id)
            .collect();
        let user_joins: Vec<OfficeUserId> = self
            .office_users
            .iter()
            .filter(|j| j.office_id == id)
            .map(|j| j.id)
            .collect();

        let ops = counter::offices::office_plan(self, Some(&old), None);
        write::commit(self, Office::NAME, MutationKind::Delete, ops, |db| {
            for join_id in commune_joins {
                db.office_communes.remove(&join_id);
            }
            for join_id in user_joins {
                db.office_users.remove(&join_id);
            }
            db.offices.remove(&id);
        })
    }

    // ======================================================================
    // Office joins
    // ======================================================================

    pub fn insert_office_commune(
        &mut self,
        row: OfficeCommune,
    ) -> Result<OfficeCommuneId, InternalError> {
        validate::office_commune(self, &row)?;
        if self.office_communes.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "office_communes: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = counter::offices::office_commune_plan(self, None, Some(&row));
        write::commit(self, OfficeCommune::NAME, MutationKind::Insert, ops, |db| {
            db.office_communes.insert(row);
        })?;

        Ok(id)
    }

    pub fn delete_office_commune(&mut self, id: OfficeCommuneId) -> Result<(), InternalError> {
        let old = self
            .office_communes
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("office_communes: {id}")))?;

        let ops = counter::offices::office_commune_plan(self, Some(&old), None);
        write::commit(self, OfficeCommune::NAME, MutationKind::Delete, ops, |db| {
            db.office_communes.remove(&id);
        })
    }

    pub fn insert_office_user(&mut self, row: OfficeUser) -> Result<OfficeUserId, InternalError> {
        validate::office_user(self, &row)?;
        if self.office_users.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "office_users: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = counter::offices::office_user_plan(self, None, Some(&row));
        write::commit(self, OfficeUser::NAME, MutationKind::Insert, ops, |db| {
            db.office_users.insert(row);
        })?;

        Ok(id)
    }

    pub fn delete_office_user(&mut self, id: OfficeUserId) -> Result<(), InternalError> {
        let old = self
            .office_users
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("office_users: {id}")))?;

        let ops = counter::offices::office_user_plan(self, Some(&old), None);
        write::commit(self, OfficeUser::NAME, MutationKind::Delete, ops, |db| {
            db.office_users.remove(&id);
        })
    }

    // ======================================================================
    // Reports
    // ======================================================================

    pub fn insert_report(&mut self, mut row: Report) -> Result<ReportId, InternalError> {
        sanitize::report(&mut row);
        validate::report(self, &row)?;
        if self.reports.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "reports: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = counter::reports::plan(self, None, Some(&row));
        write::commit(self, Report::NAME, MutationKind::Insert, ops, |db| {
            db.reports.insert(row);
        })?;

        Ok(id)
    }

    /// Form-content update. The state machine owns the state, the lifecycle
    /// timestamps, the routing fields, and the reference; they are carried
    /// over from the stored row.
    pub fn update_report(&mut self, mut row: Report) -> Result<(), InternalError> {
        let old = self
            .reports
            .get(&row.id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("reports: {}", row.id)))?;

        row.state = old.state;
        row.package_id = old.package_id;
        row.transmission_id = old.transmission_id;
        row.office_id = old.office_id;
        row.ddfip_id = old.ddfip_id;
        row.assignee_id = old.assignee_id;
        row.reference = old.reference.clone();
        row.resolution_motif = old.resolution_motif;
        row.completed_at = old.completed_at;
        row.transmitted_at = old.transmitted_at;
        row.acknowledged_at = old.acknowledged_at;
        row.accepted_at = old.accepted_at;
        row.assigned_at = old.assigned_at;
        row.denied_at = old.denied_at;
        row.resolved_at = old.resolved_at;
        row.approved_at = old.approved_at;
        row.rejected_at = old.rejected_at;
        row.canceled_at = old.canceled_at;
        row.discarded_at = old.discarded_at;
        row.created_at = old.created_at;
        row.updated_at = Utc::now();

        sanitize::report(&mut row);
        validate::report(self, &row)?;

        let ops = counter::reports::plan(self, Some(&old), Some(&row));
        write::commit(self, Report::NAME, MutationKind::Update, ops, |db| {
            db.reports.insert(row);
        })
    }

    /// Attach a report to a package. The link is set lazily: only a draft or
    /// ready report may move, and only into a live, untransmitted package of
    /// its own collectivity. The package's member counters follow through the
    /// footprint diff.
    pub fn assign_report_to_package(
        &mut self,
        id: ReportId,
        package_id: PackageId,
    ) -> Result<(), InternalError> {
        let old = self
            .reports
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("reports: {id}")))?;
        let package = self
            .packages
            .get(&package_id)
            .ok_or_else(|| InternalError::store_not_found(format!("packages: {package_id}")))?;

        if old.package_id == Some(package_id) {
            return Ok(());
        }
        if !matches!(old.state, ReportState::Draft | ReportState::Ready) {
            return Err(InternalError::validation(format!(
                "reports: {id} is {} and can no longer change packages",
                old.state
            )));
        }
        if package.is_transmitted() {
            return Err(InternalError::validation(format!(
                "packages: {package_id} is already transmitted"
            )));
        }
        if package.is_discarded() {
            return Err(InternalError::validation(format!(
                "packages: {package_id} is discarded"
            )));
        }
        if package.collectivity_id != old.collectivity_id {
            return Err(InternalError::validation(format!(
                "packages: {package_id} belongs to another collectivity"
            )));
        }

        let mut new = old.clone();
        new.package_id = Some(package_id);
        new.updated_at = Utc::now();
        self.write_report(&old, new)
    }

    /// Attach a report to a transmission batch, under the same lazy-link
    /// rules as packages: draft or ready reports only, open batches only.
    pub fn assign_report_to_transmission(
        &mut self,
        id: ReportId,
        transmission_id: TransmissionId,
    ) -> Result<(), InternalError> {
        let old = self
            .reports
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("reports: {id}")))?;
        let transmission = self.transmissions.get(&transmission_id).ok_or_else(|| {
            InternalError::store_not_found(format!("transmissions: {transmission_id}"))
        })?;

        if old.transmission_id == Some(transmission_id) {
            return Ok(());
        }
        if !matches!(old.state, ReportState::Draft | ReportState::Ready) {
            return Err(InternalError::validation(format!(
                "reports: {id} is {} and can no longer change transmissions",
                old.state
            )));
        }
        if transmission.is_completed() {
            return Err(InternalError::validation(format!(
                "transmissions: {transmission_id} is already completed"
            )));
        }
        if transmission.collectivity_id != old.collectivity_id {
            return Err(InternalError::validation(format!(
                "transmissions: {transmission_id} belongs to another collectivity"
            )));
        }

        let mut new = old.clone();
        new.transmission_id = Some(transmission_id);
        new.updated_at = Utc::now();
        self.write_report(&old, new)
    }

    pub fn discard_report(&mut self, id: ReportId) -> Result<(), InternalError> {
        let old = self
            .reports
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("reports: {id}")))?;

        if old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(Some(Utc::now()));
        new.updated_at = Utc::now();

        let ops = counter::reports::plan(self, Some(&old), Some(&new));
        write::commit(self, Report::NAME, MutationKind::Discard, ops, |db| {
            db.reports.insert(new);
        })
    }

    pub fn undiscard_report(&mut self, id: ReportId) -> Result<(), InternalError> {
        let old = self
            .reports
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("reports: {id}")))?;

        if !old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(None);
        new.updated_at = Utc::now();
        validate::report(self, &new)?;

        let ops = counter::reports::plan(self, Some(&old), Some(&new));
        write::commit(self, Report::NAME, MutationKind::Undiscard, ops, |db| {
            db.reports.insert(new);
        })
    }

    pub fn delete_report(&mut self, id: ReportId) -> Result<(), InternalError> {
        let old = self
            .reports
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("reports: {id}")))?;

        let ops = counter::reports::plan(self, Some(&old), None);
        write::commit(self, Report::NAME, MutationKind::Delete, ops, |db| {
            db.reports.remove(&id);
        })
    }

    /// Full-row report write used by the state machine. The caller has
    /// already derived `new` from the stored row; no field is preserved.
    pub(crate) fn write_report(&mut self, old: &Report, new: Report) -> Result<(), InternalError> {
        let ops = counter::reports::plan(self, Some(old), Some(&new));
        write::commit(self, Report::NAME, MutationKind::Update, ops, |db| {
            db.reports.insert(new);
        })
    }

    // ======================================================================
    // Packages
    // ======================================================================

    pub fn insert_package(&mut self, mut row: Package) -> Result<PackageId, InternalError> {
        sanitize::package(&mut row);
        validate::package(self, &row)?;
        if self.packages.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "packages: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        let ops = counter::packages::plan(self, None, Some(&row));
        write::commit(self, Package::NAME, MutationKind::Insert, ops, |db| {
            db.packages.insert(row);
        })?;

        Ok(id)
    }

    pub fn discard_package(&mut self, id: PackageId) -> Result<(), InternalError> {
        let old = self
            .packages
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("packages: {id}")))?;

        if old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(Some(Utc::now()));

        let ops = counter::packages::plan(self, Some(&old), Some(&new));
        write::commit(self, Package::NAME, MutationKind::Discard, ops, |db| {
            db.packages.insert(new);
        })
    }

    pub fn undiscard_package(&mut self, id: PackageId) -> Result<(), InternalError> {
        let old = self
            .packages
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("packages: {id}")))?;

        if !old.is_discarded() {
            return Ok(());
        }

        let mut new = old.clone();
        new.set_discarded_at(None);
        validate::package(self, &new)?;

        let ops = counter::packages::plan(self, Some(&old), Some(&new));
        write::commit(self, Package::NAME, MutationKind::Undiscard, ops, |db| {
            db.packages.insert(new);
        })
    }

    /// Hard delete, refused while member reports still point at the package.
    pub fn delete_package(&mut self, id: PackageId) -> Result<(), InternalError> {
        let old = self
            .packages
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("packages: {id}")))?;

        if self.reports.iter().any(|r| r.package_id == Some(id)) {
            return Err(InternalError::store_conflict(format!(
                "packages: {id} still has member reports"
            )));
        }

        let ops = counter::packages::plan(self, Some(&old), None);
        write::commit(self, Package::NAME, MutationKind::Delete, ops, |db| {
            db.packages.remove(&id);
        })
    }

    /// Full-row package write used by the state machine.
    pub(crate) fn write_package(&mut self, old: &Package, new: Package) -> Result<(), InternalError> {
        let ops = counter::packages::plan(self, Some(old), Some(&new));
        write::commit(self, Package::NAME, MutationKind::Update, ops, |db| {
            db.packages.insert(new);
        })
    }

    // ======================================================================
    // Transmissions
    // ======================================================================

    pub fn insert_transmission(
        &mut self,
        row: Transmission,
    ) -> Result<TransmissionId, InternalError> {
        validate::transmission(self, &row)?;
        if self.transmissions.contains(&row.id) {
            return Err(InternalError::store_conflict(format!(
                "transmissions: duplicate id {}",
                row.id
            )));
        }

        let id = row.id;
        write::commit(self, Transmission::NAME, MutationKind::Insert, Vec::new(), |db| {
            db.transmissions.insert(row);
        })?;

        Ok(id)
    }

    pub fn delete_transmission(&mut self, id: TransmissionId) -> Result<(), InternalError> {
        let old = self
            .transmissions
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("transmissions: {id}")))?;

        if old.is_completed() {
            return Err(InternalError::store_conflict(format!(
                "transmissions: {id} is completed"
            )));
        }
        if self.reports.iter().any(|r| r.transmission_id == Some(id)) {
            return Err(InternalError::store_conflict(format!(
                "transmissions: {id} still has member reports"
            )));
        }

        write::commit(self, Transmission::NAME, MutationKind::Delete, Vec::new(), |db| {
            db.transmissions.remove(&id);
        })
    }

    /// Full-row transmission write used by the state machine.
    pub(crate) fn write_transmission(&mut self, new: Transmission) -> Result<(), InternalError> {
        write::commit(self, Transmission::NAME, MutationKind::Update, Vec::new(), |db| {
            db.transmissions.insert(new);
        })
    }
}
