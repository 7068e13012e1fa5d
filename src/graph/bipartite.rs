use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::constants::PAYMENT_RECORD_FIELDS;
use crate::error::Result;
use crate::graph::adjacency::AdjacencySet;
use crate::graph::entity::EntityId;

/// Doctor/company payment graph, held as adjacency in both directions.
#[derive(Debug, Clone, Default)]
pub struct BipartiteGraph {
    pub company_to_doctors: AdjacencySet,
    pub doctor_to_companies: AdjacencySet,
    /// 1-based line numbers that were skipped.
    pub bad_lines: Vec<usize>,
    pub payments: usize,
    pub total_amount: f64,
}

impl BipartiteGraph {
    /// Reads `<doctorId> <companyId> <amount>` records after one header line.
    pub fn load(path: &Path, io_buffer_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(io_buffer_size, file);
        Self::from_reader(reader)
    }

    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut graph = BipartiteGraph::default();
        let mut buf = Vec::new();
        let mut line_number = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_number += 1;
            if line_number == 1 {
                continue;
            }

            match parse_payment(&buf) {
                Some((doctor, company, amount)) => {
                    graph.doctor_to_companies.insert(doctor.clone(), company.clone());
                    graph.company_to_doctors.insert(company, doctor);
                    graph.payments += 1;
                    graph.total_amount += amount;
                }
                None => {
                    debug!("Skipping malformed payment record at line {}", line_number);
                    graph.bad_lines.push(line_number);
                }
            }
        }

        info!(
            "Loaded {} payments: {} doctors, {} companies, {} bad lines",
            graph.payments,
            graph.doctor_to_companies.len(),
            graph.company_to_doctors.len(),
            graph.bad_lines.len()
        );
        Ok(graph)
    }
}

fn parse_payment(raw: &[u8]) -> Option<(EntityId, EntityId, f64)> {
    let line = std::str::from_utf8(raw).ok()?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != PAYMENT_RECORD_FIELDS {
        return None;
    }
    let amount = fields[2].parse::<f64>().ok()?;
    Some((EntityId::parse(fields[0]), EntityId::parse(fields[1]), amount))
}
