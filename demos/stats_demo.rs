use clap::Parser;
use clap::ValueEnum;
use hashlinq::EqualityComparer;
use hashlinq::HashTable;
use hashlinq::hash_table::Entry;
use siphasher::sip::SipHasher;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KeyHasher {
    /// The runtime kernel's integer hash
    Kernel,
    /// SipHash through `EqualityComparer::from_build_hasher`
    Sip,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Remove every n-th key after filling, then refill the freed slots
    #[arg(short = 'r', long = "remove_every", default_value_t = 0)]
    remove_every: usize,

    #[arg(long = "hasher", value_enum, default_value_t = KeyHasher::Kernel)]
    hasher: KeyHasher,
}

#[derive(Clone, Default)]
struct SipBuilder;

impl core::hash::BuildHasher for SipBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    let comparer = match args.hasher {
        KeyHasher::Kernel => EqualityComparer::default(),
        KeyHasher::Sip => EqualityComparer::from_build_hasher(SipBuilder),
    };
    let mut table: HashTable<u64, u64> =
        HashTable::with_capacity_and_comparer(args.target_capacity, comparer);

    println!("Actual capacity: {}", table.capacity());
    println!("Filling table with u64 keys...");

    let num_values = table.capacity() as u64;
    for key in 0..num_values {
        match table.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(key * 2);
            }
            Entry::Occupied(_) => {
                panic!("Key already exists in table: {}", key);
            }
        }
    }

    if args.remove_every > 0 {
        let removed = (0..num_values)
            .step_by(args.remove_every)
            .filter(|key| table.remove(key))
            .count();
        println!(
            "Removed {} keys, {} slots on the free list",
            removed,
            table.free_slot_count()
        );

        let mut refilled = 0;
        for key in num_values..num_values + removed as u64 {
            if table.add(key, key * 2, false) {
                refilled += 1;
            }
        }
        println!("Refilled {} keys, capacity still {}", refilled, table.capacity());
    }

    println!("Inserted {} values into table", table.len());
    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.capacity() as f64) * 100.0
    );

    table.print_chain_histogram();
    table.debug_stats().print();
}
