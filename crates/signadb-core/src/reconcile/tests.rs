use super::*;
use crate::{
    lifecycle,
    model::{
        id::{CollectivityId, ReportId},
        office::OfficeCommune,
        organization::{Collectivity, Dgfip},
        package::Package,
        territory::{Commune, TerritoryRef},
    },
    test_support,
};
use proptest::prelude::*;

fn transmit_one(db: &mut Db, coll: CollectivityId, reference: &str) -> ReportId {
    let package = db.insert_package(Package::new(coll, reference)).unwrap();
    let mut report = test_support::fillable_report(coll);
    report.package_id = Some(package);
    let id = db.insert_report(report).unwrap();
    lifecycle::complete(db, id).unwrap();
    lifecycle::transmit_package(db, package).unwrap();
    id
}

#[test]
fn reconcile_is_idempotent_after_incremental_writes() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    let ddfip = test_support::seed_ddfip(&mut db);
    let office = test_support::seed_office(&mut db, ddfip);

    db.insert_office_commune(OfficeCommune::new(office, "64102"))
        .unwrap();
    db.discard_collectivity(coll).unwrap();
    db.undiscard_collectivity(coll).unwrap();

    // The incremental engine already left every counter at ground truth.
    assert_eq!(reset_all_counters(&mut db).total(), 0);
    assert_eq!(reset_all_counters(&mut db).total(), 0);
}

#[test]
fn reconcile_repairs_corrupted_rows() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    test_support::seed_collectivity(&mut db, fixture.bayonne);

    // Simulate drift the incremental engine never produces.
    db.departements
        .get_mut(&fixture.departement)
        .unwrap()
        .communes_count = 17;
    db.regions.get_mut(&fixture.region).unwrap().collectivities_count = 0;

    let report = reset_all_counters(&mut db);
    assert_eq!(report.departements, 1);
    assert_eq!(report.regions, 1);
    assert_eq!(report.total(), 2);

    assert_eq!(
        db.departements()
            .get(&fixture.departement)
            .unwrap()
            .communes_count,
        2
    );
    assert_eq!(
        db.regions().get(&fixture.region).unwrap().collectivities_count,
        1
    );

    // Repaired once, stable thereafter.
    assert_eq!(reset_all_counters(&mut db).total(), 0);
}

#[test]
fn discarded_dgfip_report_tallies_stay_frozen() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);
    test_support::seed_ddfip(&mut db);
    let dgfip = db.insert_dgfip(Dgfip::new("DGFIP")).unwrap();

    transmit_one(&mut db, coll, "2024-06-0001");
    assert_eq!(db.dgfips().get(&dgfip).unwrap().reports_transmitted_count, 1);

    db.discard_dgfip(dgfip).unwrap();
    transmit_one(&mut db, coll, "2024-06-0002");

    // Frozen while discarded; a full reconcile must leave the row alone.
    assert_eq!(db.dgfips().get(&dgfip).unwrap().reports_transmitted_count, 1);
    assert_eq!(reset_all_counters(&mut db).total(), 0);

    // Reactivation re-derives the tallies, and both paths agree again.
    db.undiscard_dgfip(dgfip).unwrap();
    assert_eq!(db.dgfips().get(&dgfip).unwrap().reports_transmitted_count, 2);
    assert_eq!(reset_all_counters(&mut db).total(), 0);
}

#[test]
fn reconcile_touches_only_dirty_tables() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);

    db.epcis.get_mut(&fixture.epci).unwrap().communes_count = 0;

    let report = reset_all_counters(&mut db);
    assert_eq!(report.epcis, 1);
    assert_eq!(report.communes, 0);
    assert_eq!(report.departements, 0);
}

///
/// Op
///
/// One step of a random mutation sequence. Index arguments pick a target row
/// modulo the table size at apply time; validation rejections (duplicate
/// codes, duplicate sirens) are expected and skipped.
///

#[derive(Clone, Debug)]
enum Op {
    InsertCommune(u8),
    ReparentCommune(u8),
    InsertCollectivity(u8),
    ToggleCollectivity(u8),
    DeleteCollectivity(u8),
    InsertPackagedReport(u8),
    TransmitPackage(u8),
    DiscardReport(u8),
    ToggleDgfip,
}

fn apply(db: &mut Db, op: &Op) {
    match op {
        Op::InsertCommune(n) => {
            let _ = db.insert_commune(Commune::new(
                format!("Commune {n}"),
                format!("64{n:03}"),
                "64",
            ));
        }
        Op::ReparentCommune(n) => {
            let ids: Vec<_> = db.communes().iter().map(|row| row.id).collect();
            if ids.is_empty() {
                return;
            }
            let id = ids[*n as usize % ids.len()];
            let mut commune = db.communes().get(&id).unwrap().clone();
            commune.code_departement = if *n % 2 == 0 { "64" } else { "40" }.into();
            db.update_commune(commune).unwrap();
        }
        Op::InsertCollectivity(n) => {
            let ids: Vec<_> = db.communes().iter().map(|row| row.id).collect();
            if ids.is_empty() {
                return;
            }
            let commune = ids[*n as usize % ids.len()];
            let _ = db.insert_collectivity(Collectivity::new(
                format!("Collectivity {n}"),
                format!("2124{n:05}"),
                TerritoryRef::Commune(commune),
            ));
        }
        Op::ToggleCollectivity(n) => {
            let ids: Vec<_> = db.collectivities().iter().map(|row| row.id).collect();
            if ids.is_empty() {
                return;
            }
            let id = ids[*n as usize % ids.len()];
            if db.collectivities().get(&id).unwrap().discarded_at.is_some() {
                // May be rejected when a live row reclaimed the siren.
                let _ = db.undiscard_collectivity(id);
            } else {
                db.discard_collectivity(id).unwrap();
            }
        }
        Op::DeleteCollectivity(n) => {
            let ids: Vec<_> = db.collectivities().iter().map(|row| row.id).collect();
            if ids.is_empty() {
                return;
            }
            db.delete_collectivity(ids[*n as usize % ids.len()]).unwrap();
        }
        Op::InsertPackagedReport(n) => {
            let ids: Vec<_> = db.collectivities().iter().map(|row| row.id).collect();
            if ids.is_empty() {
                return;
            }
            let coll = ids[*n as usize % ids.len()];
            // Packages are never deleted here, so the table size yields a
            // fresh reference.
            let reference = format!("2024-07-{:04}", db.packages().len());
            let Ok(package) = db.insert_package(Package::new(coll, reference)) else {
                return;
            };
            let mut report = test_support::fillable_report(coll);
            report.package_id = Some(package);
            report.sandbox = *n % 3 == 0;
            let id = db.insert_report(report).unwrap();
            lifecycle::complete(db, id).unwrap();
        }
        Op::TransmitPackage(n) => {
            let ids: Vec<_> = db.packages().iter().map(|row| row.id).collect();
            if ids.is_empty() {
                return;
            }
            lifecycle::transmit_package(db, ids[*n as usize % ids.len()]).unwrap();
        }
        Op::DiscardReport(n) => {
            let ids: Vec<_> = db.reports().iter().map(|row| row.id).collect();
            if ids.is_empty() {
                return;
            }
            db.discard_report(ids[*n as usize % ids.len()]).unwrap();
        }
        Op::ToggleDgfip => {
            let Some((id, discarded)) = db
                .dgfips()
                .iter()
                .next()
                .map(|row| (row.id, row.discarded_at.is_some()))
            else {
                return;
            };
            if discarded {
                db.undiscard_dgfip(id).unwrap();
            } else {
                db.discard_dgfip(id).unwrap();
            }
        }
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::InsertCommune),
        any::<u8>().prop_map(Op::ReparentCommune),
        any::<u8>().prop_map(Op::InsertCollectivity),
        any::<u8>().prop_map(Op::ToggleCollectivity),
        any::<u8>().prop_map(Op::DeleteCollectivity),
        any::<u8>().prop_map(Op::InsertPackagedReport),
        any::<u8>().prop_map(Op::TransmitPackage),
        any::<u8>().prop_map(Op::DiscardReport),
        Just(Op::ToggleDgfip),
    ]
}

proptest! {
    // Whatever the mutation history, the incremental counters must already
    // equal ground truth: a full reconcile run has nothing to repair.
    #[test]
    fn incremental_counters_match_ground_truth(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut db = Db::new();
        test_support::seed_territory(&mut db);
        db.insert_departement(crate::model::territory::Departement::new("Landes", "40", "75"))
            .unwrap();
        test_support::seed_ddfip(&mut db);
        db.insert_dgfip(Dgfip::new("DGFIP")).unwrap();

        for op in &ops {
            apply(&mut db, op);
        }

        prop_assert_eq!(reset_all_counters(&mut db).total(), 0);
    }
}
