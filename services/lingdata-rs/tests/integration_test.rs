use std::collections::{BTreeSet, HashMap};

use lingdata_core::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn wordlist(entries: &[(&str, &str)]) -> LanguageWordlist {
    entries.iter().copied().collect()
}

#[test]
fn test_lexical_end_to_end() {
    init_tracing();

    let mut wordlists = HashMap::new();
    wordlists.insert("A".to_string(), wordlist(&[("cat", "cat"), ("dog", "dog"), ("fish", "fiS")]));
    wordlists.insert("B".to_string(), wordlist(&[("cat", "cat"), ("dog", "dog"), ("fish", "fiS")]));
    wordlists.insert("C".to_string(), wordlist(&[("cat", "kat"), ("tree", "tri")]));

    let pairs = same_family_pairs([("A", "F"), ("B", "F"), ("C", "F")]);
    assert_eq!(pairs.len(), 3);

    let engine = LexicalDistanceEngine::default();
    let records: Vec<LexicalDistanceRecord> = engine
        .compare_all(&wordlists, &pairs)
        .collect::<Result<_>>()
        .unwrap();

    // A-C and B-C share only "cat"
    assert_eq!(records.len(), 1);
    let ab = &records[0];
    assert_eq!((ab.language_1.as_str(), ab.language_2.as_str()), ("A", "B"));
    assert_eq!(ab.ldn, 0.0);
    assert_eq!(ab.common_meanings, 3);
}

#[test]
fn test_two_shared_meanings_need_lower_threshold() {
    let a = wordlist(&[("cat", "cat"), ("dog", "dog")]);
    let b = wordlist(&[("cat", "cat"), ("dog", "dog")]);
    let c = wordlist(&[("cat", "kat")]);

    let strict = LexicalDistanceEngine::default();
    assert!(strict.pairwise_distance(&a, &b).unwrap().is_none());

    let relaxed = LexicalDistanceEngine::default().with_min_common_meanings(1);
    let d = relaxed.pairwise_distance(&a, &b).unwrap().unwrap();
    assert_eq!(d.ldn, 0.0);
    assert_eq!(d.common_meanings, 2);
    assert!(relaxed.pairwise_distance(&a, &c).unwrap().is_none());
}

#[test]
fn test_ldn_is_symmetric() {
    let engine = LexicalDistanceEngine::default();
    let a = wordlist(&[("I", "ya"), ("you", "tu"), ("we", "nosotros"), ("dog", "pero")]);
    let b = wordlist(&[("I", "yo"), ("you", "tu"), ("we", "nos"), ("fish", "pesk")]);

    let ab = engine.pairwise_distance(&a, &b).unwrap().unwrap();
    let ba = engine.pairwise_distance(&b, &a).unwrap().unwrap();
    assert!((ab.ldn - ba.ldn).abs() < 1e-12);
    assert_eq!(ab.common_meanings, ba.common_meanings);
    assert!(ab.ldnd > 0.0 && ba.ldnd > 0.0);
}

#[test]
fn test_wordlists_from_asjp_cells() {
    let mut builder = WordlistBuilder::asjp_core();
    for (language, cells) in [
        ("SPANISH", [("I", "yo"), ("you", "tu"), ("water", "agua"), ("fire", "%fuego")]),
        ("PORTUGUESE", [("I", "eu"), ("you", "tu"), ("water", "agwa"), ("fire", "fogu")]),
    ] {
        for (meaning, cell) in cells {
            builder.add_cell(language, meaning, cell);
        }
    }
    let wordlists = builder.finish();
    assert_eq!(wordlists["SPANISH"].len(), 3);

    let engine = LexicalDistanceEngine::default();
    let d = engine
        .pairwise_distance(&wordlists["PORTUGUESE"], &wordlists["SPANISH"])
        .unwrap()
        .unwrap();
    assert_eq!(d.common_meanings, 3);
    assert!(d.ldn > 0.0 && d.ldn < 1.0);
    assert!(d.ldnd < 1.0);
}

#[test]
fn test_tree_end_to_end() {
    init_tracing();

    let forest = parse_glottolog("(('Z [zzzz1234]-l-':1)'X [xxxx1234]-l-':1,'Y [yyyy1234][yyy]-l-':1)'R [rrrr1234]':1;")
        .unwrap();
    let records = vec![
        LanguoidNode::new("rrrr1234", "R", Level::Family),
        LanguoidNode::new("xxxx1234", "X", Level::Language)
            .with_coordinates(10.0, 10.0)
            .with_attribute(AttributeKind::Macroarea, "Africa"),
        LanguoidNode::new("yyyy1234", "Y", Level::Language)
            .with_coordinates(10.0, 20.0)
            .with_attribute(AttributeKind::Iso639_3, "yyy"),
        LanguoidNode::new("zzzz1234", "Z", Level::Dialect),
    ];

    let index = LanguoidTreeIndex::build(records, &forest).unwrap();
    assert_eq!(index.state(), PassState::Resolved);

    let subtree = |c: &str| index.get(c).unwrap().subtree_depth.unwrap();
    assert_eq!(subtree("rrrr1234"), 2);
    assert_eq!(subtree("xxxx1234"), 1);
    assert_eq!(subtree("yyyy1234"), 0);
    assert_eq!(subtree("zzzz1234"), 0);

    let root = index.get("rrrr1234").unwrap();
    assert_eq!(root.descendants.get("xxxx1234"), Some(&-1));
    assert_eq!(root.descendants.get("yyyy1234"), Some(&-1));
    assert_eq!(root.descendants.get("zzzz1234"), Some(&-2));
    assert!(root.macroarea.contains("Africa"));

    let z = index.get("zzzz1234").unwrap();
    assert_eq!(z.coordinates, Some(Coordinates::new(10.0, 10.0)));
    assert!(z.macroarea.contains("Africa"));

    let hierarchy: Vec<HierarchyRecord> = index.hierarchy_records().collect();
    assert_eq!(hierarchy.len(), 4);
    assert!(hierarchy.iter().all(|h| h.family_id == "rrrr1234"));

    let builder = DistanceMatrixBuilder::new(&index, &GeoConfig::default()).unwrap();
    let distances: Vec<LanguagePairDistance> = builder.build().collect();
    assert_eq!(distances.len(), 6);

    let xz = distances
        .iter()
        .find(|d| d.glottocode_1 == "xxxx1234" && d.glottocode_2 == "zzzz1234")
        .unwrap();
    assert_eq!(xz.shared_ancestors, 1);
    assert_eq!(xz.geo_distance_m, Some(0.0));

    let xy = distances
        .iter()
        .find(|d| d.glottocode_1 == "xxxx1234" && d.glottocode_2 == "yyyy1234")
        .unwrap();
    let km = xy.geo_distance_m.unwrap() / 1000.0;
    // ten degrees of longitude at 10N is about 1095 km
    assert!((km - 1095.0).abs() < 10.0, "{km}");
}

#[test]
fn test_records_serialize() {
    let record = LexicalDistanceRecord {
        language_1: "A".to_string(),
        language_2: "B".to_string(),
        ldn: 0.25,
        ldnd: 0.5,
        common_meanings: 28,
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["common_meanings"], 28);

    let pair = LanguagePairDistance {
        glottocode_1: "a".to_string(),
        glottocode_2: "b".to_string(),
        shared_ancestors: 2,
        geo_distance_m: None,
    };
    let json = serde_json::to_string(&pair).unwrap();
    assert!(json.contains("\"geo_distance_m\":null"));
}

#[test]
fn test_config_drives_engine() {
    let config = Config::from_json_str(r#"{"lexical": {"min_common_meanings": 0}}"#).unwrap();
    let engine = LexicalDistanceEngine::new(&config.lexical);
    assert_eq!(engine.min_common_meanings(), 0);

    let pairs: BTreeSet<(String, String)> = BTreeSet::new();
    let wordlists: HashMap<String, LanguageWordlist> = HashMap::new();
    assert_eq!(engine.compare_all(&wordlists, &pairs).count(), 0);
}
