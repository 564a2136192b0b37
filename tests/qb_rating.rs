use std::path::PathBuf;

use gridiron_factors::dataset::load_quarterback_seasons;
use gridiron_factors::qb_rating::{self, TABLE_HEADERS};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn rates_every_quarterback_in_file_order() {
    let records =
        load_quarterback_seasons(&fixture_path("qb_sample.csv")).expect("fixture should load");
    let comparison = qb_rating::analyze(&records).expect("no zero-attempt rows");

    assert_eq!(comparison.ratings.len(), 12);
    let rodgers = &comparison.ratings[0];
    assert_eq!(rodgers.player, "Aaron Rodgers");
    // (4381 - 174) / 572 and 5 / 572
    assert!((rodgers.true_net_ypa - 4207.0 / 572.0).abs() < 1e-12);
    assert!((rodgers.interception_rate - 5.0 / 572.0).abs() < 1e-12);
    assert!((rodgers.rating - 10.910703671328672).abs() < 1e-9);

    let kizer = comparison
        .ratings
        .iter()
        .find(|r| r.player == "DeShone Kizer")
        .expect("Kizer row");
    assert!((kizer.rating - 6.206810084033614).abs() < 1e-9);
}

#[test]
fn custom_rating_tracks_both_reference_ratings() {
    let records =
        load_quarterback_seasons(&fixture_path("qb_sample.csv")).expect("fixture should load");
    let comparison = qb_rating::analyze(&records).expect("no zero-attempt rows");
    let m = &comparison.correlation;

    assert_eq!(m.labels, ["OldQBR", "TOTALQBR", "OurRating"]);
    let old = m.by_label("OldQBR", "OurRating").expect("defined");
    let total = m.by_label("TOTALQBR", "OurRating").expect("defined");
    assert!((old - 0.9417653435272437).abs() < 1e-9);
    assert!((total - 0.9244916694391606).abs() < 1e-9);
    assert_eq!(m.get(0, 1), m.get(1, 0));
}

#[test]
fn report_prints_the_table_then_the_matrix() {
    let records =
        load_quarterback_seasons(&fixture_path("qb_sample.csv")).expect("fixture should load");
    let comparison = qb_rating::analyze(&records).expect("no zero-attempt rows");
    let mut out = Vec::new();
    qb_rating::write_report(&mut out, &comparison).expect("write to memory");
    let text = String::from_utf8(out).expect("utf8");

    let header = text.lines().nth(1).expect("header row");
    for name in TABLE_HEADERS {
        assert!(header.contains(name), "missing {name} in {header}");
    }
    let rodgers = text
        .lines()
        .find(|l| l.contains("Aaron Rodgers"))
        .expect("Rodgers row");
    assert!(rodgers.contains("99.1") && rodgers.contains("72.8") && rodgers.contains("10.9"));
    assert!(text.contains("Correlation Matrix"));
    assert!(text.contains("0.941765"));
}

#[test]
fn zero_attempts_abort_the_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("qb.csv");
    std::fs::write(
        &path,
        "Player,Yds,SackYards,Att,Int,OldQBR,TOTALQBR\n\
         Starter,4000,100,500,10,95.0,65.0\n\
         Emergency Backup,0,0,0,0,39.6,1.0\n",
    )
    .expect("write csv");
    let records = load_quarterback_seasons(&path).expect("csv loads");
    let err = qb_rating::analyze(&records).expect_err("zero attempts");
    assert!(err.to_string().contains("Emergency Backup"));
}
