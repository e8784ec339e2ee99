//! Reporting of the convection clusters found while fusing a model.
//!
//! Each cluster of coplanar external areas shares one characteristic length.
//! Sinks receive the cluster's bounding box so the aggregation can be inspected
//! or plotted.

use crate::geom::area::Location;
use crate::{Point, Result};
use std::io::Write;

/// One aggregated convection cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    pub location: Location,
    pub characteristic_length: f64,
    /// Corners of the bounding box in global coordinates, in outline order.
    pub corners: [Point; 4],
    /// Number of external areas in the cluster.
    pub area_count: usize,
}

pub trait ClusterSink {
    fn report(&mut self, cluster: &ClusterReport) -> Result<()>;
}

/// Discards all reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ClusterSink for NullSink {
    fn report(&mut self, _cluster: &ClusterReport) -> Result<()> {
        Ok(())
    }
}

impl ClusterSink for Vec<ClusterReport> {
    fn report(&mut self, cluster: &ClusterReport) -> Result<()> {
        self.push(cluster.clone());
        Ok(())
    }
}

/// Writes one CSV row per cluster.
#[derive(Debug)]
pub struct CsvClusterSink<W: Write> {
    writer: W,
    rows: usize,
}

impl<W: Write> CsvClusterSink<W> {
    pub const HEADER: &'static str = "cluster,location,characteristic_length,area_count,\
x0,y0,z0,x1,y1,z1,x2,y2,z2,x3,y3,z3";

    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0 }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> ClusterSink for CsvClusterSink<W> {
    fn report(&mut self, cluster: &ClusterReport) -> Result<()> {
        if self.rows == 0 {
            writeln!(self.writer, "{}", Self::HEADER)?;
        }
        write!(
            self.writer,
            "{},{},{},{}",
            self.rows, cluster.location, cluster.characteristic_length, cluster.area_count
        )?;
        for c in &cluster.corners {
            write!(self.writer, ",{},{},{}", c.x, c.y, c.z)?;
        }
        writeln!(self.writer)?;
        self.rows += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ClusterReport {
        ClusterReport {
            location: Location::Top,
            characteristic_length: 0.25,
            corners: [
                Point::new(0.0, 0.0, 1.0),
                Point::new(0.0, 1.0, 1.0),
                Point::new(1.0, 1.0, 1.0),
                Point::new(1.0, 0.0, 1.0),
            ],
            area_count: 4,
        }
    }

    #[test]
    fn test_csv_rows() {
        let mut sink = CsvClusterSink::new(Vec::new());
        sink.report(&report()).unwrap();
        sink.report(&report()).unwrap();
        assert_eq!(sink.rows(), 2);
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("cluster,location"));
        assert!(lines[1].starts_with("0,TOP,0.25,4,0,0,1,"));
        assert!(lines[2].starts_with("1,TOP,"));
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<ClusterReport> = Vec::new();
        sink.report(&report()).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].area_count, 4);
    }
}
