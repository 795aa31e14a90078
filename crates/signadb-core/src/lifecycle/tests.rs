use super::*;
use crate::{
    model::{
        package::Package,
        report::{FormType, Report},
        transmission::Transmission,
    },
    test_support,
};

fn transmitted_report(db: &mut Db) -> ReportId {
    let fixture = test_support::seed_territory(db);
    let coll = test_support::seed_collectivity(db, fixture.bayonne);
    test_support::seed_ddfip(db);

    let package = db.insert_package(Package::new(coll, "2024-06-0001")).unwrap();

    let mut report = test_support::fillable_report(coll);
    report.package_id = Some(package);
    let id = db.insert_report(report).unwrap();

    complete(db, id).unwrap();
    transmit_package(db, package).unwrap();
    id
}

#[test]
fn complete_requires_every_required_field() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    let mut report = test_support::fillable_report(coll);
    report.date_constat = None;
    let id = db.insert_report(report).unwrap();

    let err = complete(&mut db, id).unwrap_err();
    assert!(matches!(err, TransitionError::Missing { ref field } if field == "date_constat"));
    assert_eq!(db.reports().get(&id).unwrap().state, ReportState::Draft);

    let mut report = db.reports().get(&id).unwrap().clone();
    report.date_constat = Some("2024-01-15".to_string());
    db.update_report(report).unwrap();

    let outcome = complete(&mut db, id).unwrap();
    assert!(outcome.changed);
    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.state, ReportState::Ready);
    assert!(report.completed_at.is_some());
}

#[test]
fn uncomplete_returns_to_draft() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    let id = db.insert_report(test_support::fillable_report(coll)).unwrap();

    complete(&mut db, id).unwrap();
    uncomplete(&mut db, id).unwrap();

    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.state, ReportState::Draft);
    assert!(report.completed_at.is_none());

    // Re-entrant from draft.
    assert!(!uncomplete(&mut db, id).unwrap().changed);
}

#[test]
fn transmit_package_stamps_routes_and_references() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    let ddfip = test_support::seed_ddfip(&mut db);

    let package = db.insert_package(Package::new(coll, "2024-06-0001")).unwrap();
    let mut report = test_support::fillable_report(coll);
    report.package_id = Some(package);
    let id = db.insert_report(report).unwrap();
    complete(&mut db, id).unwrap();

    // Nothing counted before transmission.
    assert_eq!(db.ddfips().get(&ddfip).unwrap().reports_count, 0);
    assert_eq!(db.collectivities().get(&coll).unwrap().packages_transmitted_count, 0);

    transmit_package(&mut db, package).unwrap();

    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.state, ReportState::Transmitted);
    assert!(report.transmitted_at.is_some());
    assert_eq!(report.reference.as_deref(), Some("2024-06-0001-1"));
    assert_eq!(report.ddfip_id, Some(ddfip));

    assert_eq!(db.ddfips().get(&ddfip).unwrap().reports_count, 1);
    assert_eq!(db.collectivities().get(&coll).unwrap().reports_transmitted_count, 1);
    assert_eq!(db.collectivities().get(&coll).unwrap().packages_transmitted_count, 1);

    // Discarding the report drains the tallies again.
    db.discard_report(id).unwrap();
    assert_eq!(db.ddfips().get(&ddfip).unwrap().reports_count, 0);
    assert_eq!(db.collectivities().get(&coll).unwrap().reports_transmitted_count, 0);

    // Re-transmitting is a no-op.
    assert!(!transmit_package(&mut db, package).unwrap().changed);
}

#[test]
fn sandbox_package_transmits_without_counting() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    test_support::seed_ddfip(&mut db);

    let mut package = Package::new(coll, "2024-06-0002");
    package.sandbox = true;
    let package = db.insert_package(package).unwrap();

    let mut report = test_support::fillable_report(coll);
    report.package_id = Some(package);
    report.sandbox = true;
    let id = db.insert_report(report).unwrap();
    complete(&mut db, id).unwrap();

    transmit_package(&mut db, package).unwrap();

    assert_eq!(db.reports().get(&id).unwrap().state, ReportState::Transmitted);
    assert_eq!(db.collectivities().get(&coll).unwrap().reports_transmitted_count, 0);
    assert_eq!(db.collectivities().get(&coll).unwrap().packages_transmitted_count, 0);
}

#[test]
fn complete_transmission_transmits_member_packages() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    test_support::seed_ddfip(&mut db);
    let publisher = db
        .insert_publisher(crate::model::organization::Publisher::new(
            "Fiscalite & Territoire",
            "511022394",
        ))
        .unwrap();

    let transmission = db
        .insert_transmission(Transmission::for_publisher(coll, publisher))
        .unwrap();
    let package = db.insert_package(Package::new(coll, "2024-06-0003")).unwrap();

    let mut report = test_support::fillable_report(coll);
    report.package_id = Some(package);
    report.transmission_id = Some(transmission);
    let id = db.insert_report(report).unwrap();
    complete(&mut db, id).unwrap();

    complete_transmission(&mut db, transmission).unwrap();

    assert!(db.transmissions().get(&transmission).unwrap().is_completed());
    assert!(db.packages().get(&package).unwrap().is_transmitted());
    assert_eq!(db.reports().get(&id).unwrap().state, ReportState::Transmitted);

    // Completing again changes nothing.
    assert!(!complete_transmission(&mut db, transmission).unwrap().changed);
}

#[test]
fn transmit_leaves_incomplete_drafts_behind() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    test_support::seed_ddfip(&mut db);

    let package = db.insert_package(Package::new(coll, "2024-06-0004")).unwrap();

    let mut ready = test_support::fillable_report(coll);
    ready.package_id = Some(package);
    let ready = db.insert_report(ready).unwrap();
    complete(&mut db, ready).unwrap();

    // Never completed: has not passed the completeness gate.
    let mut draft = Report::new(coll, FormType::EvaluationLocalHabitation);
    draft.package_id = Some(package);
    let draft = db.insert_report(draft).unwrap();

    transmit_package(&mut db, package).unwrap();

    assert_eq!(db.reports().get(&ready).unwrap().state, ReportState::Transmitted);
    assert_eq!(
        db.reports().get(&ready).unwrap().reference.as_deref(),
        Some("2024-06-0004-1")
    );

    let draft = db.reports().get(&draft).unwrap();
    assert_eq!(draft.state, ReportState::Draft);
    assert!(draft.transmitted_at.is_none());
    assert!(draft.reference.is_none());
}

#[test]
fn decisions_require_assignment_or_resolution() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);

    // Transmitted but never accepted or assigned: no decision yet.
    assert!(matches!(
        approve(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));
    assert!(matches!(
        reject(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));

    acknowledge(&mut db, id).unwrap();
    assert!(matches!(
        approve(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));

    accept(&mut db, id).unwrap();
    assert!(matches!(
        approve(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));
    assert!(matches!(
        reject(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));
    assert_eq!(db.reports().get(&id).unwrap().state, ReportState::Accepted);
    assert!(db.reports().get(&id).unwrap().approved_at.is_none());
}

#[test]
fn assignment_flow_counts_on_the_office() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);
    let ddfip = db.ddfips().iter().next().unwrap().id;
    let office = test_support::seed_office(&mut db, ddfip);

    acknowledge(&mut db, id).unwrap();
    accept(&mut db, id).unwrap();
    assign(&mut db, id, office).unwrap();

    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.state, ReportState::Assigned);
    assert!(report.assigned_at.is_some());
    assert_eq!(db.offices().get(&office).unwrap().reports_assigned_count, 1);

    // Re-assigning to another office moves the count, not the timestamp.
    let stamped = report.assigned_at;
    let other = test_support::seed_office(&mut db, ddfip);
    assign(&mut db, id, other).unwrap();

    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.assigned_at, stamped);
    assert_eq!(db.offices().get(&office).unwrap().reports_assigned_count, 0);
    assert_eq!(db.offices().get(&other).unwrap().reports_assigned_count, 1);

    unassign(&mut db, id).unwrap();
    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.state, ReportState::Accepted);
    assert!(report.assigned_at.is_none());
    assert_eq!(db.offices().get(&other).unwrap().reports_assigned_count, 0);
}

#[test]
fn approve_is_reentrant_without_touching_timestamps() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);
    let ddfip = db.ddfips().iter().next().unwrap().id;
    let office = test_support::seed_office(&mut db, ddfip);

    acknowledge(&mut db, id).unwrap();
    accept(&mut db, id).unwrap();
    assign(&mut db, id, office).unwrap();

    assert!(approve(&mut db, id).unwrap().changed);
    let first = db.reports().get(&id).unwrap().clone();

    assert!(!approve(&mut db, id).unwrap().changed);
    let second = db.reports().get(&id).unwrap();
    assert_eq!(second.approved_at, first.approved_at);
    assert_eq!(second.updated_at, first.updated_at);
}

#[test]
fn approve_and_reject_are_mutually_exclusive() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);
    let ddfip = db.ddfips().iter().next().unwrap().id;
    let office = test_support::seed_office(&mut db, ddfip);
    let coll = db.collectivities().iter().next().unwrap().id;

    acknowledge(&mut db, id).unwrap();
    accept(&mut db, id).unwrap();
    assign(&mut db, id, office).unwrap();

    reject(&mut db, id).unwrap();
    assert_eq!(db.collectivities().get(&coll).unwrap().reports_rejected_count, 1);

    // Approving a rejected report clears the rejection in the same step.
    approve(&mut db, id).unwrap();
    let report = db.reports().get(&id).unwrap();
    assert!(report.approved_at.is_some());
    assert!(report.rejected_at.is_none());
    assert_eq!(db.collectivities().get(&coll).unwrap().reports_approved_count, 1);
    assert_eq!(db.collectivities().get(&coll).unwrap().reports_rejected_count, 0);
    assert_eq!(db.offices().get(&office).unwrap().reports_approved_count, 1);
}

#[test]
fn unapprove_and_unreject_fail_from_the_other_decision() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);
    let ddfip = db.ddfips().iter().next().unwrap().id;
    let office = test_support::seed_office(&mut db, ddfip);

    acknowledge(&mut db, id).unwrap();
    accept(&mut db, id).unwrap();
    assign(&mut db, id, office).unwrap();
    approve(&mut db, id).unwrap();

    assert!(matches!(
        unreject(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));

    unapprove(&mut db, id).unwrap();
    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.state, ReportState::Assigned);
    assert!(report.approved_at.is_none());
}

#[test]
fn resolve_records_the_office_motion() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);
    let ddfip = db.ddfips().iter().next().unwrap().id;
    let office = test_support::seed_office(&mut db, ddfip);

    acknowledge(&mut db, id).unwrap();
    accept(&mut db, id).unwrap();
    assign(&mut db, id, office).unwrap();

    resolve(&mut db, id, ResolutionMotif::Applicable).unwrap();
    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.state, ReportState::Applicable);
    let stamped = report.resolved_at;

    // Same motif again: no-op. The other motif: switch, same stamp.
    assert!(!resolve(&mut db, id, ResolutionMotif::Applicable).unwrap().changed);
    assert!(resolve(&mut db, id, ResolutionMotif::Inapplicable).unwrap().changed);
    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.state, ReportState::Inapplicable);
    assert_eq!(report.resolved_at, stamped);

    // Still counted as sitting with the office.
    assert_eq!(db.offices().get(&office).unwrap().reports_assigned_count, 1);

    // A resolved report may be decided directly.
    approve(&mut db, id).unwrap();
    assert_eq!(db.reports().get(&id).unwrap().state, ReportState::Approved);
}

#[test]
fn deny_updates_the_response_only() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);

    acknowledge(&mut db, id).unwrap();
    accept(&mut db, id).unwrap();

    deny(&mut db, id, Some("incomplet".to_string())).unwrap();
    let stamped = db.reports().get(&id).unwrap().denied_at;

    deny(&mut db, id, Some("incomplet, merci de corriger".to_string())).unwrap();
    let report = db.reports().get(&id).unwrap();
    assert_eq!(report.denied_at, stamped);
    assert_eq!(report.reponse.as_deref(), Some("incomplet, merci de corriger"));

    undeny(&mut db, id).unwrap();
    assert!(db.reports().get(&id).unwrap().denied_at.is_none());
}

#[test]
fn cancel_is_terminal() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);

    cancel(&mut db, id).unwrap();
    assert_eq!(db.reports().get(&id).unwrap().state, ReportState::Canceled);

    assert!(!cancel(&mut db, id).unwrap().changed);
    assert!(matches!(
        approve(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));
}

#[test]
fn draft_reports_refuse_ddfip_operations() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    let id = db
        .insert_report(Report::new(coll, FormType::EvaluationLocalHabitation))
        .unwrap();

    assert!(matches!(
        acknowledge(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));
    assert!(matches!(
        approve(&mut db, id).unwrap_err(),
        TransitionError::InvalidTransition { .. }
    ));
}

#[test]
fn assign_requires_an_existing_office() {
    let mut db = Db::new();
    let id = transmitted_report(&mut db);

    let err = assign(&mut db, id, crate::model::id::OfficeId::new()).unwrap_err();
    assert!(matches!(err, TransitionError::Missing { ref field } if field == "office"));
}
