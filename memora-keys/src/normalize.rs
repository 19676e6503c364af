//! Order normalization for argument trees.
//!
//! Every unordered mapping, at any depth, has its entries sorted by
//! `"{type_name}_{repr}"` of the (already normalized) key. Bucketing on the
//! type name first keeps ordering total across mixed key types. Sequences and
//! ordered mappings keep their order; only their children are normalized.
//! Entries whose keys tie (duplicates, or `NaN`) are ordered by value.
//!
//! The input is never modified; a fresh tree is returned.

use memora_core::Arg;

/// Returns a normalized copy of `arg`.
pub fn normalize(arg: &Arg) -> Arg {
    match arg {
        Arg::List(items) => Arg::List(items.iter().map(normalize).collect()),
        Arg::Tuple(items) => Arg::Tuple(items.iter().map(normalize).collect()),
        Arg::Map(entries) => Arg::Map(sorted_entries(entries)),
        Arg::OrderedMap(entries) => Arg::OrderedMap(
            entries
                .iter()
                .map(|(k, v)| (normalize(k), normalize(v)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// Sort key for a mapping key: type bucket first, then canonical value.
pub fn sort_key(key: &Arg) -> String {
    format!("{}_{}", key.type_name(), key.repr())
}

/// Normalized positional arguments, as a `Tuple`.
pub fn normalize_args(args: &[Arg]) -> Arg {
    Arg::Tuple(args.iter().map(normalize).collect())
}

/// Normalized keyword arguments, as a sorted `Map` with `Str` keys.
pub fn normalize_kwargs(kwargs: &[(String, Arg)]) -> Arg {
    let entries: Vec<(Arg, Arg)> = kwargs
        .iter()
        .map(|(k, v)| (Arg::Str(k.clone()), v.clone()))
        .collect();
    Arg::Map(sorted_entries(&entries))
}

fn sorted_entries(entries: &[(Arg, Arg)]) -> Vec<(Arg, Arg)> {
    let mut keyed: Vec<((String, String), (Arg, Arg))> = entries
        .iter()
        .map(|(k, v)| {
            let key = normalize(k);
            let value = normalize(v);
            ((sort_key(&key), sort_key(&value)), (key, value))
        })
        .collect();

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, entry)| entry).collect()
}
