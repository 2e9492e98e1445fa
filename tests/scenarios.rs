//! End-to-end scenarios across the containers, the sorter and the kernel.

use std::cmp::Ordering;
use std::rc::Rc;

use hashlinq::Comparer;
use hashlinq::Dictionary;
use hashlinq::Enumerable;
use hashlinq::EqualityComparer;
use hashlinq::Error;
use hashlinq::HashSet;
use hashlinq::HashTable;
use hashlinq::Lookup;
use hashlinq::Map;
use hashlinq::Object;
use hashlinq::Value;
use hashlinq::comparer::EqualityStrategy;
use hashlinq::record;
use hashlinq::runtime;

fn abc(a: i32, b: i32, c: i32) -> Value {
    Value::from(record! { a: a, b: b, c: c })
}

#[test]
fn thousand_keys_remove_evens() {
    let mut dictionary = Dictionary::new();
    for key in 1..=1000 {
        dictionary.add(key, key.to_string()).unwrap();
    }
    for key in (2..=1000).step_by(2) {
        assert!(dictionary.remove(&key).is_some());
    }

    assert_eq!(dictionary.len(), 500);
    assert!(!dictionary.contains_key(&2));
    assert!(dictionary.contains_key(&1));
    assert_eq!(dictionary.get(&2), Err(Error::KeyNotFound));
}

#[test]
fn remove_is_idempotent() {
    let mut table = HashTable::new();
    table.add("k", 1, false);
    let slots = table.slot_count();

    assert!(table.remove(&"k"));
    assert!(!table.remove(&"k"));
    assert_eq!(table.slot_count(), slots);
    assert_eq!(table.free_slot_count(), 1);
}

#[test]
fn add_then_get_round_trip() {
    let mut table = HashTable::new();
    let keys = [
        Value::from(0),
        Value::from(-0.0),
        Value::from("zero"),
        Value::Null,
        Value::from(record! { zero: 0 }),
    ];
    for (i, key) in keys.iter().enumerate() {
        table.insert(key.clone(), i);
    }

    // 0 and -0.0 are the same key, so the second insert replaced the first.
    assert_eq!(table.len(), 4);
    assert_eq!(table.get(&Value::from(0)), Some(&1));
    assert_eq!(table.get(&Value::from("zero")), Some(&2));
    assert_eq!(table.get(&Value::Undefined), Some(&3));
    assert_eq!(table.get(&Value::from(record! { zero: 0.0 })), Some(&4));
}

#[test]
fn multi_key_ordering() {
    let rows = vec![abc(2, 3, 1), abc(1, 2, 3), abc(2, 1, 3), abc(2, 1, 2)];

    let ordered = rows
        .order_by(|x| x.field("a"))
        .then_by(|x| x.field("b"))
        .then_by_descending(|x| x.field("c"));

    let expected = vec![abc(1, 2, 3), abc(2, 1, 3), abc(2, 1, 2), abc(2, 3, 1)];
    assert_eq!(ordered.to_vec(), expected);
    // Deferred orderings can be iterated again.
    assert_eq!(ordered.iter().cloned().collect::<Vec<_>>(), expected);
}

#[test]
fn ties_keep_original_order() {
    let rows = vec![
        Value::from(record! { a: 1, b: 2 }),
        Value::from(record! { a: 1, b: 1 }),
    ];
    let sorted = rows.clone().order_by(|x| x.field("a")).to_vec();
    assert_eq!(sorted, rows);
    assert_eq!(sorted[0].field("b"), Value::from(2));
}

#[test]
fn lookup_of_repeated_numbers() {
    let lookup = [1, 1, 2, 3, 3, 4, 4, 4].to_lookup(|n| *n);

    assert_eq!(lookup.len(), 4);
    assert_eq!(lookup.get(&4).len(), 3);
    assert!(lookup.get(&5).is_empty());
    let sizes: Vec<usize> = lookup.iter().map(|g| g.len()).collect();
    assert_eq!(sizes, vec![2, 1, 2, 3]);
}

#[test]
fn structurally_equal_records() {
    let a = Value::from(record! { name: "ada", born: 1815 });
    let b = Value::from(record! { name: "ada", born: 1815 });
    assert!(runtime::equals(&a, &b));
    assert_eq!(runtime::hash(&a), runtime::hash(&b));

    let c = Value::from(record! { name: "ada", born: 1816 });
    assert!(!runtime::equals(&a, &c));

    let reordered = Value::from(record! { born: 1815, name: "ada" });
    assert!(!runtime::equals(&a, &reordered));
}

#[derive(Debug)]
struct Account {
    id: u32,
}

impl Object for Account {
    fn hash_hook(&self) -> Option<u32> {
        Some(self.id)
    }

    fn equals_hook(&self, other: &Value) -> Option<bool> {
        other.downcast_ref::<Account>().map(|o| o.id == self.id)
    }

    fn compare_hook(&self, other: &Value) -> Option<Ordering> {
        match other {
            Value::Number(n) => f64::from(self.id).partial_cmp(n),
            _ => other.downcast_ref::<Account>().map(|o| self.id.cmp(&o.id)),
        }
    }
}

#[derive(Debug)]
struct Opaque;

impl Object for Opaque {}

#[test]
fn objects_use_hooks_or_identity() {
    let mut set = HashSet::new();
    assert!(set.add(Value::object(Account { id: 7 })));
    assert!(!set.add(Value::object(Account { id: 7 })));
    assert!(set.add(Value::object(Account { id: 8 })));

    let opaque = Value::object(Opaque);
    assert!(set.add(opaque.clone()));
    assert!(!set.add(opaque.clone()));
    assert!(set.add(Value::object(Opaque)));
    assert_eq!(set.len(), 4);

    let sorted = vec![
        Value::object(Account { id: 3 }),
        Value::object(Account { id: 1 }),
        Value::object(Account { id: 2 }),
    ]
    .order_by(|v| v.clone())
    .to_vec();
    let ids: Vec<u32> = sorted
        .iter()
        .filter_map(|v| v.downcast_ref::<Account>().map(|a| a.id))
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    // The ordering hook also runs against plain numbers, on either side.
    let mixed = vec![
        Value::from(2.5),
        Value::object(Account { id: 3 }),
        Value::from(0.5),
        Value::object(Account { id: 1 }),
    ]
    .order_by(|v| v.clone())
    .to_vec();
    let rendered: Vec<String> = mixed
        .iter()
        .map(|v| match v.downcast_ref::<Account>() {
            Some(account) => format!("#{}", account.id),
            None => format!("{}", v.as_number().unwrap_or(f64::NAN)),
        })
        .collect();
    assert_eq!(rendered, ["0.5", "#1", "2.5", "#3"]);
}

struct CaseInsensitive;

impl EqualityStrategy<String> for CaseInsensitive {
    fn hash(&self, value: &String) -> u32 {
        runtime::hash_str(&value.to_lowercase())
    }

    fn equals(&self, a: &String, b: &String) -> bool {
        a.to_lowercase() == b.to_lowercase()
    }
}

#[test]
fn shared_strategy_across_containers() {
    let strategy: Rc<dyn EqualityStrategy<String>> = Rc::new(CaseInsensitive);
    let comparer = EqualityComparer::of(strategy);

    let mut map = Map::with_comparer(comparer.clone());
    map.set("Key".to_string(), 1).set("KEY".to_string(), 2);
    assert_eq!(map.size(), 1);
    assert_eq!(map.get(&"key".to_string()), Some(&2));

    let mut lookup = Lookup::with_comparer(comparer.clone());
    lookup.add("A".to_string(), 1);
    lookup.add("a".to_string(), 2);
    assert_eq!(lookup.get(&"A".to_string()), &[1, 2]);

    let mut set = HashSet::with_comparer(comparer);
    set.union_with(["x".to_string(), "X".to_string(), "y".to_string()]);
    assert_eq!(set.len(), 2);
    assert!(set.set_equals(["Y".to_string(), "x".to_string()]));
}

#[test]
fn comparer_normalisation() {
    let default: Comparer<i32> = Comparer::of(None::<Comparer<i32>>);
    assert!(default.is_default());
    let custom = Comparer::of(|a: &i32, b: &i32| b.cmp(a));
    assert!(!custom.is_default());

    let descending = (1..=5).order_by_with(|n| *n, &custom, false).to_vec();
    assert_eq!(descending, vec![5, 4, 3, 2, 1]);

    let equality: EqualityComparer<i32> = EqualityComparer::of(None::<EqualityComparer<i32>>);
    assert!(equality.is_default());
}

#[test]
fn query_terminals_raise_errors() {
    let empty: Vec<i32> = Vec::new();
    assert_eq!(empty.clone().first_or_err(), Err(Error::EmptyCollection));
    assert_eq!(empty.single(), Err(Error::EmptyCollection));
    assert!(matches!(vec![1, 2].single(), Err(Error::InvalidArgument { .. })));
    assert_eq!(
        vec![1, 2].element_at(2),
        Err(Error::IndexOutOfRange { index: 2, len: 2 })
    );
    assert!(matches!(
        [1, 2, 1].to_dictionary(|n| *n, |n| n),
        Err(Error::DuplicateKey)
    ));
}

#[test]
fn capacity_limits_are_reported() {
    let result = HashTable::<i32, i32>::try_with_capacity_and_comparer(
        hashlinq::hash_table::MAX_CAPACITY + 1,
        EqualityComparer::default(),
    );
    assert!(matches!(result, Err(Error::InvalidArgument { .. })));

    let mut table: HashTable<i32, i32> = HashTable::new();
    assert!(table.try_reserve(usize::MAX).is_err());
    assert!(table.try_reserve(10).is_ok());
    assert!(table.capacity() >= 10);
}
