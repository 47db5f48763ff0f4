//! End-to-end coupling: link two declared models, then read through the
//! bindings against a live field store.

use std::collections::BTreeMap;

use rhizoflux_coupling::{CouplingError, ModelInterface, TranslatorTable, link};
use rhizoflux_graph::Field;
use rhizoflux_types::VertexId;

fn field(values: &[(u64, f64)]) -> Field {
    values.iter().map(|(k, v)| (VertexId(*k), *v)).collect()
}

fn store() -> BTreeMap<String, Field> {
    let mut store = BTreeMap::new();
    store.insert("pool_A".to_owned(), field(&[(1, 5.0), (2, 7.0)]));
    store.insert("pool_B".to_owned(), field(&[(1, 3.0), (2, 0.0)]));
    store
}

fn models() -> (ModelInterface, ModelInterface) {
    let receiver = ModelInterface::new("receiver").with_inputs("state", &["X"]);
    let provider = ModelInterface::new("provider").with_provides(&["pool_A", "pool_B"]);
    (receiver, provider)
}

#[test]
fn translated_input_sums_converted_pools() {
    let (receiver, provider) = models();
    let Ok(table) = TranslatorTable::parse("X:\n  pool_A: 2\n  pool_B: 10\n") else {
        panic!("translator table did not parse");
    };
    let Ok(bindings) = link(&receiver, &provider, "state", &table, false) else {
        panic!("link failed");
    };
    let x = bindings.read("X", &store()).ok();
    assert_eq!(x, Some(field(&[(1, 40.0), (2, 14.0)])));
}

#[test]
fn key_mismatch_surfaces_at_read_time() {
    let (receiver, provider) = models();
    let Ok(table) = TranslatorTable::parse("X:\n  pool_A: 2\n  pool_B: 10\n") else {
        panic!("translator table did not parse");
    };
    let Ok(bindings) = link(&receiver, &provider, "state", &table, false) else {
        panic!("link failed");
    };

    let mut partial = store();
    partial.insert("pool_B".to_owned(), field(&[(1, 3.0)]));
    let result = bindings.read("X", &partial);
    assert!(matches!(result, Err(CouplingError::MissingKey { vertex: VertexId(2), .. })));
}
