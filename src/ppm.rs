//! Order-N adaptive model with escape fallback.
//!
//! The model is a trie of context nodes, one per observed symbol
//! history up to `max_order` symbols deep. Each node carries a count
//! table sorted descending by count plus an *escape* weight; a symbol
//! missing from the current context is coded as an escape and retried
//! one order lower, down to the order `-1` table that holds every byte
//! at a permanent count of 1. An order `-2` control table carries the
//! FLUSH and DONE sentinels that never appear as literals.
//!
//! Lower-order nodes are shared between the higher-order nodes that
//! extend them, so the trie is really a DAG: every node keeps a
//! `lesser` link to the same history with its oldest symbol dropped,
//! and the escape cascade walks exactly that chain. Nodes live in an
//! arena and are addressed by index; nothing is ever freed, only
//! rescaled.
//!
//! Compressor and expander must mutate their models in lock step; a
//! single diverging count corrupts every later symbol with no
//! detection. Everything here is therefore driven by the same totalize,
//! update, and growth routines on both sides.

use crate::bitio::{BitReader, BitWriter};
use crate::coder::{ArithmeticDecoder, ArithmeticEncoder, Interval, MAX_SCALE};
use crate::error::{Error, Result};

/// Deepest supported context order.
pub const MAX_ORDER: usize = 8;

/// Decoded stand-in for "retry one order lower".
const ESCAPE: i32 = 256;
/// Stream-terminator control symbol.
const DONE: i32 = -1;
/// Model-flush control symbol.
const FLUSH: i32 = -2;

const SCOREBOARD_CLEAR: [bool; 256] = [false; 256];

type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    symbol: u8,
    count: u8,
}

#[derive(Debug, PartialEq, Eq)]
struct Node {
    /// Count table, sorted descending by count.
    entries: Vec<Entry>,
    /// Lazily grown edges: observed symbol -> one-order-higher node.
    children: Vec<(u8, NodeId)>,
    /// Same history one order lower. Non-owning; the root tables point
    /// at themselves.
    lesser: NodeId,
}

/// The order-N context model.
///
/// Construct one per stream and feed it the exact same symbol sequence
/// on both the compress and expand side.
#[derive(Debug)]
pub struct ContextTrie {
    nodes: Vec<Node>,
    /// Current context per order; slot `o + 2` holds order `o`, from
    /// the control table at `-2` through `max_order`.
    active: Vec<NodeId>,
    max_order: i32,
    current_order: i32,
    /// Symbols already ruled out at a higher order during the current
    /// escape cascade; their mass is excluded from lower-order totals.
    scoreboard: [bool; 256],
    /// Cumulative totals of the most recently totalized node, highest
    /// slot first. `totals[0]` is the scale, `totals[1]` the running
    /// total below the escape slot.
    totals: [u16; 258],
}

impl ContextTrie {
    /// Create a model for contexts up to `max_order` symbols deep.
    pub fn new(max_order: usize) -> Result<Self> {
        if max_order > MAX_ORDER {
            return Err(Error::InvalidOrder(max_order));
        }
        let mut trie = Self {
            nodes: Vec::new(),
            active: Vec::with_capacity(max_order + 3),
            max_order: max_order as i32,
            current_order: max_order as i32,
            scoreboard: SCOREBOARD_CLEAR,
            totals: [0; 258],
        };

        // Order -2: the control table, holding the FLUSH and DONE
        // sentinels remapped to small positive codes.
        let control = trie.push_node(0);
        trie.nodes[control].entries = vec![
            Entry { symbol: (-FLUSH) as u8, count: 1 },
            Entry { symbol: (-DONE) as u8, count: 1 },
        ];

        // Order -1: the null table, every byte permanently at count 1.
        let null = trie.push_node(0);
        trie.nodes[null].lesser = null;
        trie.nodes[null].entries = (0..=255u8).map(|symbol| Entry { symbol, count: 1 }).collect();

        trie.active.push(control);
        trie.active.push(null);
        for order in 0..=max_order {
            let parent = trie.active[order + 1];
            let node = trie.allocate_child(parent, 0, parent);
            trie.active.push(node);
        }
        Ok(trie)
    }

    fn push_node(&mut self, lesser: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            entries: Vec::new(),
            children: Vec::new(),
            lesser,
        });
        id
    }

    /// Add `symbol` to `parent`'s count table (at count 0) if missing,
    /// and hang a fresh one-order-higher node off it.
    fn allocate_child(&mut self, parent: NodeId, symbol: u8, lesser: NodeId) -> NodeId {
        if !self.nodes[parent].entries.iter().any(|e| e.symbol == symbol) {
            self.nodes[parent].entries.push(Entry { symbol, count: 0 });
        }
        let child = self.push_node(lesser);
        self.nodes[parent].children.push((symbol, child));
        child
    }

    fn active_node(&self) -> NodeId {
        self.active[(self.current_order + 2) as usize]
    }

    /// Rebuild `totals` for `id`, rescaling as often as needed to keep
    /// the scale under the coder's bound, then mark the node's symbols
    /// on the scoreboard for the escape cascade.
    fn totalize(&mut self, id: NodeId) {
        loop {
            let node = &self.nodes[id];
            let n = node.entries.len();
            let mut max = 0u8;
            self.totals[n + 1] = 0;
            for i in (2..=n + 1).rev() {
                let e = node.entries[i - 2];
                let mut below = self.totals[i];
                if e.count != 0 && (self.current_order == -2 || !self.scoreboard[e.symbol as usize]) {
                    below += u16::from(e.count);
                }
                self.totals[i - 1] = below;
                if e.count > max {
                    max = e.count;
                }
            }
            if max == 0 {
                self.totals[0] = 1;
            } else {
                // PPM-C-like escape estimate from the entry count and
                // the dominant count.
                let top = (n - 1) as u32;
                let weight = (256 - top) * top / 256 / u32::from(max) + 1;
                self.totals[0] = weight as u16 + self.totals[1];
            }
            if self.totals[0] < MAX_SCALE {
                break;
            }
            self.rescale(id);
        }

        let node = &self.nodes[id];
        for e in node.entries.iter().take(node.entries.len().saturating_sub(1)) {
            if e.count != 0 {
                self.scoreboard[e.symbol as usize] = true;
            }
        }
    }

    /// Halve every count; trim trailing dead entries only on nodes with
    /// no child edges, since a trimmed slot could otherwise strand a
    /// grown context.
    fn rescale(&mut self, id: NodeId) {
        let childless = self.nodes[id].children.is_empty();
        let node = &mut self.nodes[id];
        for e in &mut node.entries {
            e.count /= 2;
        }
        if childless {
            while node.entries.last().is_some_and(|e| e.count == 0) {
                node.entries.pop();
            }
        }
    }

    /// Look up `c` in the current context. Returns its interval and
    /// `false`, or the escape interval and `true` after dropping one
    /// order.
    fn convert_int_to_symbol(&mut self, c: i32) -> (Interval, bool) {
        let id = self.active_node();
        self.totalize(id);
        let scale = self.totals[0];

        let target: Option<u8> = if self.current_order == -2 {
            Some((-c) as u8)
        } else if c >= 0 {
            Some(c as u8)
        } else {
            // Control symbols escape through every literal table.
            None
        };
        if let Some(t) = target {
            let node = &self.nodes[id];
            for (i, e) in node.entries.iter().enumerate() {
                if e.symbol == t {
                    if e.count == 0 {
                        break;
                    }
                    return (
                        Interval {
                            low_count: self.totals[i + 2],
                            high_count: self.totals[i + 1],
                            scale,
                        },
                        false,
                    );
                }
            }
        }

        self.current_order -= 1;
        (
            Interval {
                low_count: self.totals[1],
                high_count: self.totals[0],
                scale,
            },
            true,
        )
    }

    /// Totalize the current context and return its scale (decode side).
    fn get_symbol_scale(&mut self) -> u16 {
        let id = self.active_node();
        self.totalize(id);
        self.totals[0]
    }

    /// Map a cumulative count back to a symbol. Returns [`ESCAPE`],
    /// [`DONE`], [`FLUSH`], or the literal byte, plus the interval to
    /// strip from the coder.
    fn convert_symbol_to_int(&mut self, count: u16) -> (i32, Interval) {
        let id = self.active_node();
        let mut c = 0usize;
        while count < self.totals[c] {
            c += 1;
        }
        let interval = Interval {
            low_count: self.totals[c],
            high_count: self.totals[c - 1],
            scale: self.totals[0],
        };
        if c == 1 {
            self.current_order -= 1;
            return (ESCAPE, interval);
        }
        let symbol = i32::from(self.nodes[id].entries[c - 2].symbol);
        if self.current_order < -1 {
            (-symbol, interval)
        } else {
            (symbol, interval)
        }
    }

    /// Credit `symbol` to every context from the resolved order up to
    /// `max_order`, then reset the cascade state for the next input
    /// symbol.
    fn update_model(&mut self, symbol: i32) {
        if symbol >= 0 {
            let mut order = self.current_order.max(0);
            while order <= self.max_order {
                let id = self.active[(order + 2) as usize];
                self.update_table(id, symbol as u8);
                order += 1;
            }
        }
        self.current_order = self.max_order;
        self.scoreboard = SCOREBOARD_CLEAR;
    }

    fn update_table(&mut self, id: NodeId, symbol: u8) {
        let node = &mut self.nodes[id];
        let mut index = match node.entries.iter().position(|e| e.symbol == symbol) {
            Some(i) => i,
            None => {
                node.entries.push(Entry { symbol, count: 0 });
                node.entries.len() - 1
            }
        };

        // Bubble left past equal counts to keep the table sorted
        // descending; child edges are keyed by symbol, so the swap
        // cannot detach them.
        let mut i = index;
        while i > 0 && node.entries[index].count == node.entries[i - 1].count {
            i -= 1;
        }
        if i != index {
            node.entries.swap(index, i);
            index = i;
        }

        node.entries[index].count += 1;
        if node.entries[index].count == 255 {
            self.rescale(id);
        }
    }

    /// Grow the trie for a newly observed symbol and refresh the active
    /// contexts through the lesser chain.
    fn add_character(&mut self, symbol: i32) {
        if symbol < 0 {
            return;
        }
        let top = (self.max_order + 2) as usize;
        self.active[top] = self.shift_to_next(self.active[top], symbol as u8, self.max_order);
        for order in (1..self.max_order).rev() {
            let above = self.active[(order + 3) as usize];
            self.active[(order + 2) as usize] = self.nodes[above].lesser;
        }
    }

    fn shift_to_next(&mut self, id: NodeId, symbol: u8, order: i32) -> NodeId {
        let table = self.nodes[id].lesser;
        if order == 0 {
            // There is only ever one order-0 context.
            return self.active[2];
        }
        if let Some(&(_, child)) = self.nodes[table]
            .children
            .iter()
            .find(|&&(s, _)| s == symbol)
        {
            return child;
        }
        let lesser = self.shift_to_next(table, symbol, order - 1);
        self.allocate_child(table, symbol, lesser)
    }

    /// Recursively halve every context reachable from order 0, for fast
    /// re-adaptation after a shift in the input statistics.
    fn flush_model(&mut self) {
        self.recursive_flush(self.active[2]);
    }

    fn recursive_flush(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.nodes[id].children.iter().map(|&(_, c)| c).collect();
        for child in children {
            self.recursive_flush(child);
        }
        self.rescale(id);
    }
}

/// Compress `input` with an order-`order` context model.
///
/// Every 256 input bytes the achieved ratio since the last check is
/// compared against 90%; a model that has stopped paying its way is
/// flushed, with the FLUSH symbol coded into the stream so the expander
/// flushes at the same point.
pub fn compress(input: &[u8], order: usize) -> Result<Vec<u8>> {
    let mut model = ContextTrie::new(order)?;
    let mut writer = BitWriter::new(Vec::new());
    let mut encoder = ArithmeticEncoder::new();

    let mut pos = 0usize;
    let mut text_count = 0u64;
    let mut flush_pending = false;
    let mut input_marker = 0usize;
    let mut output_marker = 0u64;
    loop {
        text_count += 1;
        if text_count & 0xFF == 0 {
            let in_delta = (pos - input_marker).max(1) as u64;
            let out_delta = writer.bytes_written() - output_marker;
            input_marker = pos;
            output_marker = writer.bytes_written();
            flush_pending = out_delta * 100 / in_delta > 90;
        }

        let c: i32 = if flush_pending {
            FLUSH
        } else if pos < input.len() {
            pos += 1;
            i32::from(input[pos - 1])
        } else {
            DONE
        };

        loop {
            let (interval, escaped) = model.convert_int_to_symbol(c);
            encoder.encode(interval, &mut writer)?;
            if !escaped {
                break;
            }
        }
        if c == DONE {
            break;
        }
        if c == FLUSH {
            model.flush_model();
            flush_pending = false;
        }
        model.update_model(c);
        model.add_character(c);
    }
    encoder.flush(&mut writer)?;
    writer.finish()
}

/// Expand a stream produced by [`compress`] with the same `order`.
pub fn expand(data: &[u8], order: usize) -> Result<Vec<u8>> {
    let mut model = ContextTrie::new(order)?;
    let mut reader = BitReader::new(data);
    let mut decoder = ArithmeticDecoder::new(&mut reader)?;

    let mut out = Vec::new();
    loop {
        let c = loop {
            let scale = model.get_symbol_scale();
            let count = decoder.current_count(scale);
            let (c, interval) = model.convert_symbol_to_int(count);
            decoder.remove(interval, &mut reader)?;
            if c != ESCAPE {
                break c;
            }
        };
        if c == DONE {
            break;
        }
        if c == FLUSH {
            model.flush_model();
        } else {
            out.push(c as u8);
        }
        model.update_model(c);
        model.add_character(c);
    }
    Ok(out)
}
