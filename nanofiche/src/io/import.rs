use std::path::Path;

use anyhow::{Result, bail};
use itertools::Itertools;
use log::{debug, warn};

use crate::entities::{
    Bin, Corner, EnvelopeConfig, Instance, Item, ReserveAnchor, ReserveShape, ReserveSize,
    ReserveZone, Sizing,
};
use crate::io::ext_repr::{
    ExtEnvelope, ExtInstance, ExtItem, ExtReserveAnchor, ExtReserveShape, ExtReserveSize,
    ExtReserveZone, ExtSizing,
};

/// Converts an [`ExtInstance`] into an [`Instance`].
///
/// Items without an `index` are ordered by the number at the end of their source name
/// (`scan-2.tif` before `scan-10.tif`).
pub fn import(ext_instance: &ExtInstance) -> Result<Instance> {
    let bin = Bin::try_new(ext_instance.bin.width, ext_instance.bin.height)?;
    let envelope = import_envelope(&ext_instance.envelope);
    envelope.validate()?;
    let reserves = ext_instance
        .reserves
        .iter()
        .map(import_reserve)
        .collect_vec();
    let items = import_items(&ext_instance.items)?;

    debug!(
        "[IMPORT] instance '{}': {} items, bin {}x{}, {:?} envelope, {} reserve(s)",
        ext_instance.name,
        items.len(),
        bin.width,
        bin.height,
        envelope.shape,
        reserves.len()
    );

    Ok(Instance::new(bin, items, envelope, reserves))
}

fn import_envelope(ext: &ExtEnvelope) -> EnvelopeConfig {
    let sizing = match ext.sizing {
        ExtSizing::Optimal => Sizing::Optimal,
        ExtSizing::Fixed { width, height } => Sizing::Fixed { width, height },
    };
    EnvelopeConfig {
        shape: ext.shape,
        ratio: ext.ratio,
        sizing,
    }
}

fn import_reserve(ext: &ExtReserveZone) -> ReserveZone {
    let shape = match ext.shape {
        ExtReserveShape::Circle => ReserveShape::Circle,
        ExtReserveShape::Square => ReserveShape::Square,
        ExtReserveShape::Rectangle { aspect } => ReserveShape::Rectangle { aspect },
    };
    let anchor = match ext.anchor {
        ExtReserveAnchor::Center => ReserveAnchor::Center,
        ExtReserveAnchor::TopLeft => ReserveAnchor::Corner(Corner::TopLeft),
        ExtReserveAnchor::TopRight => ReserveAnchor::Corner(Corner::TopRight),
        ExtReserveAnchor::BottomLeft => ReserveAnchor::Corner(Corner::BottomLeft),
        ExtReserveAnchor::BottomRight => ReserveAnchor::Corner(Corner::BottomRight),
    };
    let size = match ext.size {
        ExtReserveSize::Pixels(px) => ReserveSize::Pixels(px),
        ExtReserveSize::Percentage(pct) => ReserveSize::Percentage(pct),
    };
    ReserveZone::new(shape, anchor, size)
}

fn import_items(ext_items: &[ExtItem]) -> Result<Vec<Item>> {
    let n_indexed = ext_items.iter().filter(|i| i.index.is_some()).count();

    let items = match n_indexed {
        0 => ext_items
            .iter()
            .sorted_by_cached_key(|i| natural_order_key(&i.source))
            .enumerate()
            .map(|(seq, i)| Item::new(seq, i.source.clone(), i.width, i.height))
            .collect_vec(),
        n if n == ext_items.len() => ext_items
            .iter()
            .sorted_by_key(|i| i.index)
            .map(|i| Item::new(i.index.unwrap_or_default(), i.source.clone(), i.width, i.height))
            .collect_vec(),
        n => bail!(
            "either all or none of the items must carry an index, {n} of {} do",
            ext_items.len()
        ),
    };

    if let Some((a, _)) = items.iter().tuple_windows().find(|(a, b)| a.seq == b.seq) {
        bail!("duplicate item index: {}", a.seq);
    }
    if items.iter().any(|i| i.source.is_empty()) {
        warn!("[IMPORT] some items have an empty source reference");
    }

    Ok(items)
}

/// Sort key placing sources in the order of the number at the end of their file stem.
/// Sources without a number get 0, ties are broken by name.
pub fn natural_order_key(source: &str) -> (u64, String) {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source);
    let digits = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>();
    let number = digits
        .chars()
        .rev()
        .collect::<String>()
        .parse::<u64>()
        .unwrap_or(0);
    (number, source.to_string())
}
