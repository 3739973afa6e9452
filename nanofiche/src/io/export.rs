use std::collections::HashMap;
use std::time::Instant;

use crate::entities::{Instance, PackingResult};
use crate::io::ext_repr::{ExtGrid, ExtPlacedEnvelope, ExtSolution, ExtTile};

/// Exports a packing result to the external representation.
pub fn export(instance: &Instance, result: &PackingResult, epoch: Instant) -> ExtSolution {
    let sources = instance
        .items
        .iter()
        .map(|i| (i.seq, i.source.as_str()))
        .collect::<HashMap<_, _>>();

    let tiles = result
        .tiles()
        .iter()
        .map(|t| ExtTile {
            index: t.seq,
            source: sources.get(&t.seq).copied().unwrap_or_default().to_string(),
            x: t.x,
            y: t.y,
        })
        .collect();

    let envelope = result.envelope();

    ExtSolution {
        envelope: ExtPlacedEnvelope {
            shape: envelope.shape,
            width: envelope.width,
            height: envelope.height,
        },
        tiles,
        unplaced: result.unplaced(),
        efficiency: result.efficiency(),
        grid: result.grid().map(|g| ExtGrid {
            cols: g.cols,
            rows: g.rows,
            cell_width: g.cell_width,
            cell_height: g.cell_height,
        }),
        search: None,
        run_time_ms: epoch.elapsed().as_millis() as u64,
    }
}
