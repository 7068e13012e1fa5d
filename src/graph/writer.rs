use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::constants::COMMENT_PREFIX;
use crate::error::Result;
use crate::graph::adjacency::AdjacencySet;
use crate::graph::edge::Edge;
use crate::graph::projector::{EdgeSink, PairProjector, ProjectionMode, ProjectionStats};
use crate::utils::io::AtomicFile;

/// Writes edges as tab-separated lines under a single `# header` line.
pub struct ProjectionWriter {
    file: AtomicFile,
    edges_written: u64,
}

impl ProjectionWriter {
    pub fn create(path: &Path, header: &str, buffer_size: usize) -> Result<Self> {
        let mut file = AtomicFile::create(path, buffer_size)?;
        writeln!(file, "{}{}", COMMENT_PREFIX, header)?;
        Ok(Self { file, edges_written: 0 })
    }

    pub fn edges_written(&self) -> u64 {
        self.edges_written
    }

    pub fn finish(self) -> Result<u64> {
        Ok(self.file.commit()?)
    }
}

impl EdgeSink for ProjectionWriter {
    fn accept(&mut self, edge: Edge) -> Result<()> {
        writeln!(self.file, "{}", edge)?;
        self.edges_written += 1;
        Ok(())
    }
}

/// Projects `adjacency` and writes the pair list to `path`.
///
/// `mode` must already be resolved; `Auto` is treated as `Streaming`.
pub fn write_projection(
    projector: &PairProjector,
    adjacency: &AdjacencySet,
    path: &Path,
    header: &str,
    mode: ProjectionMode,
    buffer_size: usize,
) -> Result<ProjectionStats> {
    let mut writer = ProjectionWriter::create(path, header, buffer_size)?;

    let stats = match mode {
        ProjectionMode::Buffered => {
            let large_hubs = projector.report_large_hubs(adjacency);
            let edges = projector.project_parallel(adjacency);
            for edge in edges {
                writer.accept(edge)?;
            }
            ProjectionStats {
                hubs_seen: adjacency.len(),
                hubs_projected: adjacency.hubs().filter(|(_, n)| n.len() >= 2).count(),
                large_hubs,
                pairs_emitted: writer.edges_written(),
            }
        }
        ProjectionMode::Streaming | ProjectionMode::Auto => projector.project_into(adjacency, &mut writer)?,
    };

    let written = writer.edges_written();
    let bytes = writer.finish()?;
    info!(
        "Wrote {} edges ({} bytes, {:?}) to {}",
        written,
        bytes,
        mode,
        path.display()
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::entity::EntityId;
    use std::fs;
    use tempfile::tempdir;

    fn company_graph() -> AdjacencySet {
        [("co1", "3"), ("co1", "1"), ("co1", "2"), ("co2", "1"), ("co2", "2")]
            .iter()
            .map(|(h, n)| (EntityId::parse(h), EntityId::parse(n)))
            .collect()
    }

    #[test]
    fn test_buffered_projection_is_sorted_and_unique() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc_doc.tab");

        let stats = write_projection(
            &PairProjector::new(100),
            &company_graph(),
            &path,
            "doctorId\tdoctorId",
            ProjectionMode::Buffered,
            4096,
        )
        .unwrap();

        assert_eq!(stats.pairs_emitted, 3);
        assert_eq!(stats.hubs_projected, 2);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# doctorId\tdoctorId\n1\t2\n1\t3\n2\t3\n");
    }

    #[test]
    fn test_streaming_projection_keeps_duplicates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc_doc.tab");

        let stats = write_projection(
            &PairProjector::new(100),
            &company_graph(),
            &path,
            "doctorId\tdoctorId",
            ProjectionMode::Streaming,
            4096,
        )
        .unwrap();

        assert_eq!(stats.pairs_emitted, 4);
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "# doctorId\tdoctorId");
        assert_eq!(lines.iter().filter(|l| **l == "1\t2").count(), 2);
    }

    #[test]
    fn test_buffered_projection_counts_large_hubs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc_doc.tab");

        // co1 has three doctors, co2 only two
        let stats = write_projection(
            &PairProjector::new(2),
            &company_graph(),
            &path,
            "doctorId\tdoctorId",
            ProjectionMode::Buffered,
            4096,
        )
        .unwrap();

        assert_eq!(stats.large_hubs, 1);
        assert_eq!(stats.pairs_emitted, 3);
    }
}
