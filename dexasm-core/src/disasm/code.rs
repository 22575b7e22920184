//! Method body to [`Listing`].

use std::collections::HashMap;
use std::fmt::Write;

use dexasm_file::Code;
use dexasm_file::descriptor::type_nice;
use dexasm_ir::{Instruction, Special, code_offsets};
use dexasm_isa::Opcode;

use crate::error::DisasmError;
use crate::escape::encode_string;
use crate::listing::{
    DataTable, HandlerEntry, Listing, PackedTable, SparseTable, TryTable, label,
};
use crate::symbols::AliasTable;

/// Offsets of one method's records, split into real instructions and
/// payloads.
struct Layout<'a> {
    method: &'a str,
    insns: &'a [Instruction],
    offsets: Vec<u32>,
    /// Code offset to record index, payloads included.
    records: HashMap<u32, usize>,
    /// Record index to label number, real instructions only.
    labels: HashMap<usize, usize>,
    /// Offsets of real instructions, in order.
    real: Vec<u32>,
}

impl<'a> Layout<'a> {
    fn new(method: &'a str, insns: &'a [Instruction]) -> Self {
        let offsets = code_offsets(insns);
        let records = offsets.iter().enumerate().map(|(i, &o)| (o, i)).collect();
        let mut labels = HashMap::new();
        let mut real = Vec::new();
        for (i, insn) in insns.iter().enumerate() {
            if !insn.is_payload() {
                labels.insert(i, real.len());
                real.push(offsets[i]);
            }
        }
        Self {
            method,
            insns,
            offsets,
            records,
            labels,
            real,
        }
    }

    fn record_at(&self, from: u32, target: i64) -> Result<usize, DisasmError> {
        u32::try_from(target)
            .ok()
            .and_then(|t| self.records.get(&t).copied())
            .ok_or_else(|| DisasmError::UnmappedTarget {
                method: self.method.to_string(),
                offset: from,
                target,
            })
    }

    /// Label number of the real instruction starting at `target`.
    fn label_at(&self, from: u32, target: i64) -> Result<usize, DisasmError> {
        let record = self.record_at(from, target)?;
        self.labels
            .get(&record)
            .copied()
            .ok_or_else(|| DisasmError::UnmappedTarget {
                method: self.method.to_string(),
                offset: from,
                target,
            })
    }

    fn label_rel(&self, from: u32, rel: i32) -> Result<String, DisasmError> {
        self.label_at(from, i64::from(from) + i64::from(rel)).map(label)
    }
}

/// Disassemble one method body.
///
/// `method` only names the method in errors. Every field and method operand
/// must have an entry in `aliases`.
pub fn disassemble_method(
    method: &str,
    code: &Code,
    aliases: &AliasTable,
) -> Result<Listing, DisasmError> {
    let layout = Layout::new(method, &code.insns);
    let mut listing = Listing {
        registers: code.registers_size,
        outs_size: code.outs_size,
        ..Listing::default()
    };
    let mut data_indices: HashMap<usize, usize> = HashMap::new();

    for (i, insn) in code.insns.iter().enumerate() {
        let Some(&number) = layout.labels.get(&i) else {
            continue;
        };
        let offset = layout.offsets[i];
        let mut line = format!("{}: {}", label(number), insn.opcode.mnemonic());
        for r in &insn.registers {
            let _ = write!(line, " v{r:X}");
        }

        match &insn.special {
            Special::None => {}
            Special::Constant(v) => {
                let _ = write!(line, " #{v}");
            }
            Special::Target(t) if insn.opcode.targets_payload() => {
                let record = layout.record_at(offset, i64::from(offset) + i64::from(*t))?;
                let mismatch = |expected| DisasmError::PayloadMismatch {
                    method: method.to_string(),
                    opcode: insn.opcode.mnemonic(),
                    offset,
                    expected,
                };
                let payload = &code.insns[record];
                match (insn.opcode, &payload.special) {
                    (Opcode::FILL_ARRAY_DATA, Special::FillArrayData(d)) if payload.is_payload() => {
                        let next = listing.data_arrays.len();
                        let index = *data_indices.entry(record).or_insert(next);
                        if index == next {
                            listing.data_arrays.push(DataTable {
                                element_width: d.element_width,
                                data: d.data.clone(),
                            });
                        }
                        let _ = write!(line, " data@{index}");
                    }
                    (Opcode::PACKED_SWITCH, Special::PackedSwitch(p)) if payload.is_payload() => {
                        let targets = p
                            .targets
                            .iter()
                            .map(|&t| layout.label_rel(offset, t))
                            .collect::<Result<_, _>>()?;
                        let _ = write!(line, " packed@{}", listing.packed_switches.len());
                        listing.packed_switches.push(PackedTable {
                            first_key: p.first_key,
                            targets,
                        });
                    }
                    (Opcode::SPARSE_SWITCH, Special::SparseSwitch(s)) if payload.is_payload() => {
                        let targets = s
                            .targets
                            .iter()
                            .map(|&t| layout.label_rel(offset, t))
                            .collect::<Result<_, _>>()?;
                        let _ = write!(line, " sparse@{}", listing.sparse_switches.len());
                        listing.sparse_switches.push(SparseTable {
                            keys: s.keys.clone(),
                            targets,
                        });
                    }
                    (Opcode::FILL_ARRAY_DATA, _) => return Err(mismatch("fill-array-data")),
                    (Opcode::PACKED_SWITCH, _) => return Err(mismatch("packed-switch")),
                    _ => return Err(mismatch("sparse-switch")),
                }
            }
            Special::Target(t) => {
                let _ = write!(line, " insn@{}", layout.label_rel(offset, *t)?);
            }
            Special::String(s) => {
                let _ = write!(line, " string@{}", encode_string(s));
            }
            Special::Type(t) => {
                let _ = write!(line, " type@{}", type_nice(t));
            }
            Special::Field(f) => {
                let alias = aliases.field(f).ok_or_else(|| DisasmError::MissingAlias {
                    method: method.to_string(),
                    reference: format!("{}->{}:{}", f.class, f.name, f.type_),
                })?;
                let _ = write!(line, " field@{alias}");
            }
            Special::Method(m) => {
                let alias = aliases.method(m).ok_or_else(|| DisasmError::MissingAlias {
                    method: method.to_string(),
                    reference: format!("{}->{}{}", m.class, m.name, m.proto.descriptor()),
                })?;
                let _ = write!(line, " method@{alias}");
            }
            // Payload specials only appear on payload records, which were
            // skipped above.
            Special::PackedSwitch(_) | Special::SparseSwitch(_) | Special::FillArrayData(_) => {}
        }
        listing.insns.push(line);
    }

    for t in &code.tries {
        let start = layout.label_at(t.start_addr, t.start_addr.into())?;
        let end_addr = t.start_addr + t.insn_count;
        let last = layout
            .real
            .iter()
            .rposition(|&o| o < end_addr)
            .unwrap_or(start);
        let handlers = t
            .handlers
            .iter()
            .map(|h| {
                Ok(HandlerEntry {
                    catch_type: h.catch_type.clone(),
                    target: label(layout.label_at(t.start_addr, h.addr.into())?),
                })
            })
            .collect::<Result<_, DisasmError>>()?;
        let catch_all_target = match t.catch_all {
            Some(addr) => label(layout.label_at(t.start_addr, addr.into())?),
            None => String::new(),
        };
        listing.try_blocks.push(TryTable {
            start_insn: label(start),
            insn_length: (last.max(start) - start + 1) as i32,
            handlers,
            catch_all_target,
        });
    }

    log::debug!(
        "{method}: {} instructions, {} tables, {} try blocks",
        listing.insns.len(),
        listing.packed_switches.len() + listing.sparse_switches.len() + listing.data_arrays.len(),
        listing.try_blocks.len()
    );
    Ok(listing)
}
