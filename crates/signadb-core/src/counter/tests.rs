use super::*;
use crate::{
    error::ErrorClass,
    model::{
        office::OfficeCommune,
        organization::{OrganizationRef as OrgRef, Publisher},
        report::{FormType, Report},
        user::User,
    },
    test_support,
};

#[test]
fn batch_coalesces_opposing_adjusts() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);

    let slot = CounterSlot::DepartementCommunes(fixture.departement);
    let ops = vec![
        CounterOp::adjust(slot, -1),
        CounterOp::adjust(slot, 1),
        CounterOp::adjust(slot, 1),
    ];

    let batch = CounterBatch::prepare(&db, ops).unwrap();
    assert_eq!(batch.adjust_of(slot), Some(1));

    batch.apply(&mut db);
    let dep = db.departements().get(&fixture.departement).unwrap();
    assert_eq!(dep.communes_count, 3);
}

#[test]
fn batch_drops_net_zero_adjusts() {
    let db = Db::new();
    let slot = CounterSlot::DepartementCommunes(crate::model::id::DepartementId::new());
    let ops = vec![CounterOp::adjust(slot, 1), CounterOp::adjust(slot, -1)];

    let batch = CounterBatch::prepare(&db, ops).unwrap();
    assert_eq!(batch.adjust_of(slot), None);
}

#[test]
fn underflow_aborts_at_prepare_time() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);

    let slot = CounterSlot::EpciCommunes(fixture.epci);
    let err = CounterBatch::prepare(&db, vec![CounterOp::adjust(slot, -3)]).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvariantViolation);
}

#[test]
fn dangling_slot_is_dropped_not_an_error() {
    let mut db = Db::new();
    let slot = CounterSlot::CommuneOffices(crate::model::id::CommuneId::new());

    // Parent row does not exist; the op must neither fail nor write.
    let batch = CounterBatch::prepare(&db, vec![CounterOp::adjust(slot, -5)]).unwrap();
    batch.apply(&mut db);
}

#[test]
fn office_join_counts_by_matching_code() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let ddfip = test_support::seed_ddfip(&mut db);
    let office = test_support::seed_office(&mut db, ddfip);

    db.insert_office_commune(OfficeCommune::new(office, "64102")).unwrap();

    assert_eq!(db.communes().get(&fixture.bayonne).unwrap().offices_count, 1);
    assert_eq!(db.offices().get(&office).unwrap().communes_count, 1);

    // Re-keying the commune breaks the join: the office no longer covers it.
    let mut commune = db.communes().get(&fixture.bayonne).unwrap().clone();
    commune.code_insee = "64999".into();
    db.update_commune(commune).unwrap();

    assert_eq!(db.communes().get(&fixture.bayonne).unwrap().offices_count, 0);
    assert_eq!(db.offices().get(&office).unwrap().communes_count, 0);
}

#[test]
fn commune_reparenting_moves_exactly_one_count() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let landes = db
        .insert_departement(crate::model::territory::Departement::new(
            "Landes", "40", "75",
        ))
        .unwrap();

    assert_eq!(db.departements().get(&fixture.departement).unwrap().communes_count, 2);
    assert_eq!(db.departements().get(&landes).unwrap().communes_count, 0);

    let mut commune = db.communes().get(&fixture.anglet).unwrap().clone();
    commune.code_departement = "40".into();
    db.update_commune(commune).unwrap();

    assert_eq!(db.departements().get(&fixture.departement).unwrap().communes_count, 1);
    assert_eq!(db.departements().get(&landes).unwrap().communes_count, 1);
}

#[test]
fn user_footprint_follows_the_owning_organization() {
    let mut db = Db::new();
    let publisher = db
        .insert_publisher(Publisher::new("Fiscalite & Territoire", "511022394"))
        .unwrap();
    let other = db
        .insert_publisher(Publisher::new("Solutions Territoire", "831680600"))
        .unwrap();

    let user_id = db
        .insert_user(User::new(
            "Marc Debomy",
            "marc@example.org",
            OrgRef::Publisher(publisher),
        ))
        .unwrap();
    assert_eq!(db.publishers().get(&publisher).unwrap().users_count, 1);

    // Move the user to another organization.
    let mut user = db.users().get(&user_id).unwrap().clone();
    user.organization = OrgRef::Publisher(other);
    db.update_user(user).unwrap();

    assert_eq!(db.publishers().get(&publisher).unwrap().users_count, 0);
    assert_eq!(db.publishers().get(&other).unwrap().users_count, 1);
}

#[test]
fn discarded_report_has_empty_footprint() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    let mut report = Report::new(coll, FormType::EvaluationLocalHabitation);
    report.transmitted_at = Some(chrono::Utc::now());
    assert!(!reports::footprint(&db, &report).is_empty());

    report.discarded_at = Some(chrono::Utc::now());
    assert!(reports::footprint(&db, &report).is_empty());
}

#[test]
fn sandbox_report_never_counts_as_transmitted() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    let mut report = Report::new(coll, FormType::EvaluationLocalHabitation);
    report.transmitted_at = Some(chrono::Utc::now());
    report.sandbox = true;

    let slots = reports::footprint(&db, &report);
    assert!(!slots.contains(&CounterSlot::CollectivityReportsTransmitted(coll)));
}
