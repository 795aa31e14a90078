use super::*;
use crate::test_support;

#[test]
fn epci_resolves_through_siren() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);

    let bayonne = db.communes().get(&fixture.bayonne).unwrap();
    let epci = epci_of(&db, bayonne).unwrap();
    assert_eq!(epci.id, fixture.epci);

    // A commune without an EPCI membership resolves to none.
    let orphan_id = db
        .insert_commune(Commune::new("Laruns", "64320", "64"))
        .unwrap();
    let orphan = db.communes().get(&orphan_id).unwrap();
    assert!(epci_of(&db, orphan).is_none());
}

#[test]
fn departement_chain_tolerates_dangling_codes() {
    let mut db = Db::new();
    let id = db
        .insert_commune(Commune::new("Bayonne", "64102", "64"))
        .unwrap();

    // No departement row exists yet for code "64".
    let commune = db.communes().get(&id).unwrap();
    assert!(departement_of(&db, commune).is_none());
    assert!(region_of(&db, commune).is_none());

    db.insert_departement(Departement::new("Pyrenees-Atlantiques", "64", "75"))
        .unwrap();
    let commune = db.communes().get(&id).unwrap();
    assert!(departement_of(&db, commune).is_some());
    // Region row still missing.
    assert!(region_of(&db, commune).is_none());
}

#[test]
fn epci_spans_departements_through_member_communes() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    db.insert_departement(Departement::new("Landes", "40", "75"))
        .unwrap();

    let mut tarnos = Commune::new("Tarnos", "40312", "40");
    tarnos.siren_epci = Some(test_support::EPCI_SIREN.into());
    db.insert_commune(tarnos).unwrap();

    let epci = db.epcis().get(&fixture.epci).unwrap();
    let departements = departements_of_epci(&db, epci);
    assert_eq!(departements.len(), 2);
}

#[test]
fn ddfip_covering_routes_through_the_commune_departement() {
    let mut db = Db::new();
    test_support::seed_territory(&mut db);
    let ddfip_id = test_support::seed_ddfip(&mut db);

    let found = ddfip_covering(&db, &"64102".into()).unwrap();
    assert_eq!(found.id, ddfip_id);

    // Unknown code, no route.
    assert!(ddfip_covering(&db, &"33063".into()).is_none());

    // A discarded DDFIP stops covering.
    db.discard_ddfip(ddfip_id).unwrap();
    assert!(ddfip_covering(&db, &"64102".into()).is_none());
}

#[test]
fn collectivities_on_expands_descendants() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    for territory in [
        TerritoryRef::Commune(fixture.bayonne),
        TerritoryRef::Epci(fixture.epci),
        TerritoryRef::Departement(fixture.departement),
        TerritoryRef::Region(fixture.region),
    ] {
        let found = collectivities_on(&db, territory);
        assert_eq!(found.len(), 1, "{territory}");
        assert_eq!(found[0].id, coll);
    }

    // Siblings are not descendants.
    let found = collectivities_on(&db, TerritoryRef::Commune(fixture.anglet));
    assert!(found.is_empty());
}

#[test]
fn collectivities_on_skips_discarded_rows() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);
    let coll = test_support::seed_collectivity(&mut db, fixture.bayonne);

    db.discard_collectivity(coll).unwrap();
    assert!(collectivities_on(&db, TerritoryRef::Departement(fixture.departement)).is_empty());

    db.undiscard_collectivity(coll).unwrap();
    assert_eq!(
        collectivities_on(&db, TerritoryRef::Departement(fixture.departement)).len(),
        1
    );
}

#[test]
fn region_descendants_include_epcis_of_member_communes() {
    let mut db = Db::new();
    let fixture = test_support::seed_territory(&mut db);

    let targets = territory_and_descendants(&db, TerritoryRef::Region(fixture.region));
    assert!(targets.contains(&TerritoryRef::Region(fixture.region)));
    assert!(targets.contains(&TerritoryRef::Departement(fixture.departement)));
    assert!(targets.contains(&TerritoryRef::Commune(fixture.bayonne)));
    assert!(targets.contains(&TerritoryRef::Commune(fixture.anglet)));
    assert!(targets.contains(&TerritoryRef::Epci(fixture.epci)));
}

#[test]
fn offices_covering_filters_on_competence_and_liveness() {
    let mut db = Db::new();
    test_support::seed_territory(&mut db);
    let ddfip = test_support::seed_ddfip(&mut db);
    let office = test_support::seed_office(&mut db, ddfip);

    db.insert_office_commune(crate::model::office::OfficeCommune::new(
        office,
        "64102",
    ))
    .unwrap();

    let code = "64102".into();
    assert_eq!(
        offices_covering(&db, &code, FormType::EvaluationLocalHabitation).len(),
        1
    );
    // Competence mismatch.
    assert!(offices_covering(&db, &code, FormType::CreationLocalHabitation).is_empty());

    db.discard_office(office).unwrap();
    assert!(offices_covering(&db, &code, FormType::EvaluationLocalHabitation).is_empty());
}

#[test]
fn region_of_departement_follows_code_region() {
    let mut db = Db::new();
    let region_id = db.insert_region(Region::new("Nouvelle-Aquitaine", "75")).unwrap();
    let dep_id = db
        .insert_departement(Departement::new("Gironde", "33", "75"))
        .unwrap();

    let dep = db.departements().get(&dep_id).unwrap();
    assert_eq!(region_of_departement(&db, dep).unwrap().id, region_id);
}
