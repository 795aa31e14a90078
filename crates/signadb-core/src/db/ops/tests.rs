use crate::{
    db::Db,
    lifecycle,
    model::{
        office::OfficeUser,
        organization::{Collectivity, Dgfip, OrganizationRef, Publisher},
        package::Package,
        report::{FormType, Report},
        territory::{Commune, TerritoryRef},
        transmission::Transmission,
        user::User,
    },
    obs::sink::{EngineEvent, MutationKind, ScopedSink},
    test_support::{self, CaptureSink},
};

#[test]
fn insert_rejects_duplicate_code_insee() {
    let mut db = Db::new();
    test_support::seed_territory(&mut db);

    let err = db
        .insert_commune(Commune::new("Bayonne bis", "64102", "64"))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn update_cannot_clobber_engine_owned_counters() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    test_support::seed_collectivity(&mut db, fixture.bayonne);

    let mut commune = db.communes().get(&fixture.bayonne).unwrap().clone();
    commune.name = "Bayonne (CA)".to_string();
    commune.collectivities_count = 99;
    db.update_commune(commune).unwrap();

    assert_eq!(db.communes().get(&fixture.bayonne).unwrap().collectivities_count, 1);
}

#[test]
fn collectivity_lifecycle_drives_ancestor_counters() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let publisher = db
        .insert_publisher(Publisher::new("Fiscalite & Territoire", "511022394"))
        .unwrap();

    let mut coll = Collectivity::new(
        "Commune de Bayonne",
        "212402600",
        TerritoryRef::Commune(fixture.bayonne),
    );
    coll.publisher_id = Some(publisher);
    let coll = db.insert_collectivity(coll).unwrap();

    assert_eq!(db.communes().get(&fixture.bayonne).unwrap().collectivities_count, 1);
    assert_eq!(db.epcis().get(&fixture.epci).unwrap().collectivities_count, 1);
    assert_eq!(db.departements().get(&fixture.departement).unwrap().collectivities_count, 1);
    assert_eq!(db.regions().get(&fixture.region).unwrap().collectivities_count, 1);
    assert_eq!(db.publishers().get(&publisher).unwrap().collectivities_count, 1);

    db.discard_collectivity(coll).unwrap();
    assert_eq!(db.communes().get(&fixture.bayonne).unwrap().collectivities_count, 0);
    assert_eq!(db.publishers().get(&publisher).unwrap().collectivities_count, 0);

    db.undiscard_collectivity(coll).unwrap();
    assert_eq!(db.regions().get(&fixture.region).unwrap().collectivities_count, 1);

    db.delete_collectivity(coll).unwrap();
    assert_eq!(db.communes().get(&fixture.bayonne).unwrap().collectivities_count, 0);
    assert_eq!(db.publishers().get(&publisher).unwrap().collectivities_count, 0);
}

#[test]
fn discard_twice_is_a_noop_success() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    db.discard_collectivity(coll).unwrap();
    let stamped = db.collectivities().get(&coll).unwrap().discarded_at;

    db.discard_collectivity(coll).unwrap();
    assert_eq!(db.collectivities().get(&coll).unwrap().discarded_at, stamped);
}

#[test]
fn dgfip_is_a_singleton_among_live_rows() {
    let mut db = Db::new();

    let first = db.insert_dgfip(Dgfip::new("DGFIP")).unwrap();
    let err = db.insert_dgfip(Dgfip::new("DGFIP bis")).unwrap_err();
    assert!(err.is_validation());

    // Discarding the live row frees the slot.
    db.discard_dgfip(first).unwrap();
    let second = db.insert_dgfip(Dgfip::new("DGFIP bis")).unwrap();

    // Undiscarding while another row is live re-contests the constraint.
    let err = db.undiscard_dgfip(first).unwrap_err();
    assert!(err.is_validation());

    db.discard_dgfip(second).unwrap();
    db.undiscard_dgfip(first).unwrap();
    assert_eq!(db.live_dgfip().unwrap().id, first);
}

#[test]
fn discarding_a_user_recounts_office_membership() {
    let mut db = Db::new();
    test_support::seed_territory(&mut db);
    let ddfip = test_support::seed_ddfip(&mut db);
    let office = test_support::seed_office(&mut db, ddfip);

    let user = db
        .insert_user(User::new(
            "Paul Lebrun",
            "paul@example.org",
            OrganizationRef::Ddfip(ddfip),
        ))
        .unwrap();
    db.insert_office_user(OfficeUser::new(office, user)).unwrap();

    assert_eq!(db.ddfips().get(&ddfip).unwrap().users_count, 1);
    assert_eq!(db.offices().get(&office).unwrap().users_count, 1);

    db.discard_user(user).unwrap();
    assert_eq!(db.ddfips().get(&ddfip).unwrap().users_count, 0);
    assert_eq!(db.offices().get(&office).unwrap().users_count, 0);

    db.undiscard_user(user).unwrap();
    assert_eq!(db.offices().get(&office).unwrap().users_count, 1);
}

#[test]
fn deleting_a_user_removes_its_office_joins() {
    let mut db = Db::new();
    test_support::seed_territory(&mut db);
    let ddfip = test_support::seed_ddfip(&mut db);
    let office = test_support::seed_office(&mut db, ddfip);

    let user = db
        .insert_user(User::new(
            "Paul Lebrun",
            "paul@example.org",
            OrganizationRef::Ddfip(ddfip),
        ))
        .unwrap();
    db.insert_office_user(OfficeUser::new(office, user)).unwrap();

    db.delete_user(user).unwrap();
    assert!(db.office_users().is_empty());
    assert_eq!(db.offices().get(&office).unwrap().users_count, 0);
}

#[test]
fn user_email_is_normalized_before_uniqueness() {
    let mut db = Db::new();
    let publisher = db
        .insert_publisher(Publisher::new("Fiscalite & Territoire", "511022394"))
        .unwrap();

    db.insert_user(User::new(
        "A",
        "Marc@Example.org ",
        OrganizationRef::Publisher(publisher),
    ))
    .unwrap();

    let err = db
        .insert_user(User::new(
            "B",
            "marc@example.org",
            OrganizationRef::Publisher(publisher),
        ))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn report_anomalies_are_constrained_by_form_type() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    let mut report = Report::new(coll, FormType::CreationLocalHabitation);
    report.anomalies = vec![crate::model::report::Anomaly::Categorie];
    let err = db.insert_report(report).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn sibling_id_is_refreshed_on_save() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    let mut report = Report::new(coll, FormType::EvaluationLocalHabitation);
    report.code_insee = Some("64102".into());
    report.situation.invariant = Some("1021234567".to_string());
    let id = db.insert_report(report).unwrap();

    assert_eq!(
        db.reports().get(&id).unwrap().sibling_id.as_deref(),
        Some("641021021234567")
    );

    let mut report = db.reports().get(&id).unwrap().clone();
    report.situation.invariant = None;
    db.update_report(report).unwrap();
    assert!(db.reports().get(&id).unwrap().sibling_id.is_none());
}

#[test]
fn package_delete_is_refused_while_reports_remain() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    let package = db.insert_package(Package::new(coll, "2024-06-0001")).unwrap();
    let mut report = Report::new(coll, FormType::EvaluationLocalHabitation);
    report.package_id = Some(package);
    let report = db.insert_report(report).unwrap();

    assert!(db.delete_package(package).is_err());

    db.delete_report(report).unwrap();
    db.delete_package(package).unwrap();
}

#[test]
fn assigning_a_report_to_a_package_moves_member_counters() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    let package = db.insert_package(Package::new(coll, "2024-06-0001")).unwrap();
    let report = db
        .insert_report(Report::new(coll, FormType::EvaluationLocalHabitation))
        .unwrap();
    assert_eq!(db.packages().get(&package).unwrap().reports_count, 0);

    db.assign_report_to_package(report, package).unwrap();
    assert_eq!(db.reports().get(&report).unwrap().package_id, Some(package));
    assert_eq!(db.packages().get(&package).unwrap().reports_count, 1);

    // Re-attaching the same package is a no-op.
    db.assign_report_to_package(report, package).unwrap();
    assert_eq!(db.packages().get(&package).unwrap().reports_count, 1);

    // Moving to a sibling package carries the membership tally along.
    let sibling = db.insert_package(Package::new(coll, "2024-06-0002")).unwrap();
    db.assign_report_to_package(report, sibling).unwrap();
    assert_eq!(db.packages().get(&package).unwrap().reports_count, 0);
    assert_eq!(db.packages().get(&sibling).unwrap().reports_count, 1);
}

#[test]
fn package_assignment_is_locked_after_transmission() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    test_support::seed_ddfip(&mut db);

    let package = db.insert_package(Package::new(coll, "2024-06-0001")).unwrap();
    let report = db.insert_report(test_support::fillable_report(coll)).unwrap();
    db.assign_report_to_package(report, package).unwrap();
    lifecycle::complete(&mut db, report).unwrap();
    lifecycle::transmit_package(&mut db, package).unwrap();

    // Neither side of a transmitted link may change again.
    let late = db
        .insert_report(Report::new(coll, FormType::EvaluationLocalHabitation))
        .unwrap();
    assert!(db.assign_report_to_package(late, package).unwrap_err().is_validation());

    let fresh = db.insert_package(Package::new(coll, "2024-06-0002")).unwrap();
    assert!(db.assign_report_to_package(report, fresh).unwrap_err().is_validation());
}

#[test]
fn package_assignment_stays_within_the_collectivity() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    let other = db
        .insert_collectivity(Collectivity::new(
            "Commune d'Anglet",
            "212400242",
            TerritoryRef::Commune(fixture.anglet),
        ))
        .unwrap();

    let package = db.insert_package(Package::new(other, "2024-06-0001")).unwrap();
    let report = db
        .insert_report(Report::new(coll, FormType::EvaluationLocalHabitation))
        .unwrap();

    assert!(db.assign_report_to_package(report, package).unwrap_err().is_validation());
}

#[test]
fn assigning_a_report_to_a_completed_transmission_is_refused() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    let publisher = db
        .insert_publisher(Publisher::new("Fiscalite & Territoire", "511022394"))
        .unwrap();
    let transmission = db
        .insert_transmission(Transmission::for_publisher(coll, publisher))
        .unwrap();

    let report = db
        .insert_report(Report::new(coll, FormType::EvaluationLocalHabitation))
        .unwrap();
    db.assign_report_to_transmission(report, transmission).unwrap();
    assert_eq!(
        db.reports().get(&report).unwrap().transmission_id,
        Some(transmission)
    );

    lifecycle::complete_transmission(&mut db, transmission).unwrap();

    let late = db
        .insert_report(Report::new(coll, FormType::EvaluationLocalHabitation))
        .unwrap();
    assert!(db
        .assign_report_to_transmission(late, transmission)
        .unwrap_err()
        .is_validation());
}

#[test]
fn transmission_requires_user_xor_publisher() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    let publisher = db
        .insert_publisher(Publisher::new("Fiscalite & Territoire", "511022394"))
        .unwrap();

    let mut transmission = Transmission::for_publisher(coll, publisher);
    transmission.user_id = Some(crate::model::id::UserId::new());
    let err = db.insert_transmission(transmission).unwrap_err();
    assert!(err.is_validation());

    db.insert_transmission(Transmission::for_publisher(coll, publisher))
        .unwrap();
}

#[test]
fn mutations_emit_engine_events() {
    let sink = CaptureSink::default();
    let _guard = ScopedSink::install(&sink);

    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    test_support::seed_collectivity(&mut db, fixture.bayonne);

    let events = sink.events();
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::Mutation {
            entity: "collectivities",
            kind: MutationKind::Insert,
        }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::CounterBatch { .. })));
}
