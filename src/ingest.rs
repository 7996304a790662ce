//! Read a las file into columns.
//!
//! Columns are named the way point cloud pipelines name las dimensions (`X`, `Intensity`,
//! `ScanAngleRank`, ...), and only the dimensions the point format carries are produced.
//! Provenance from the las header is serialized into a json metadata blob.

use crate::{
    Column, Error, PointCloud, Result, dimension::OVERLAP_CLASSIFICATION, io::capacity_hint,
};
use chrono::Datelike;
use las::{Header, Point, Reader, point::ScanDirection};
use log::{debug, info};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// A point cloud read from las, with its provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct Ingested {
    /// One column per dimension.
    pub point_cloud: PointCloud,
    /// Json provenance, round-tripped verbatim.
    pub metadata: String,
}

/// Reads every point of a las file into memory.
///
/// Fails if the file cannot be read or has no points. No partial result is returned.
///
/// # Examples
///
/// ```no_run
/// let ingested = las2hdf::ingest::read("points.las").unwrap();
/// assert!(ingested.point_cloud.contains("X"));
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> Result<Ingested> {
    let path = path.as_ref();
    let las_error = |source| Error::Las {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = Reader::from_path(path).map_err(las_error)?;
    let header = reader.header().clone();
    info!(
        "reading {} points (las {}, point format {:?}) from {}",
        header.number_of_points(),
        header.version(),
        header.point_format(),
        path.display()
    );
    let mut columns = Columns::new(&header, capacity_hint(header.number_of_points()));
    for point in reader.points() {
        columns.push(&point.map_err(las_error)?);
    }
    if columns.x.is_empty() {
        return Err(Error::EmptyPointCloud(path.to_path_buf()));
    }
    let point_cloud = columns.into_point_cloud()?;
    let metadata = metadata(path, &header, &point_cloud)?;
    debug!(
        "read {} dimensions: {}",
        point_cloud.number_of_dimensions(),
        point_cloud.names().collect::<Vec<_>>().join(", ")
    );
    Ok(Ingested {
        point_cloud,
        metadata,
    })
}

#[derive(Debug, Default)]
struct Columns {
    is_extended: bool,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    intensity: Vec<u16>,
    return_number: Vec<u8>,
    number_of_returns: Vec<u8>,
    scan_direction: Vec<u8>,
    edge_of_flight_line: Vec<u8>,
    classification: Vec<u8>,
    synthetic: Vec<u8>,
    key_point: Vec<u8>,
    withheld: Vec<u8>,
    overlap: Vec<u8>,
    scan_angle: Vec<f32>,
    user_data: Vec<u8>,
    point_source_id: Vec<u16>,
    gps_time: Option<Vec<f64>>,
    scan_channel: Option<Vec<u8>>,
    color: Option<[Vec<u16>; 3]>,
    nir: Option<Vec<u16>>,
}

impl Columns {
    fn new(header: &Header, capacity: usize) -> Columns {
        let format = header.point_format();
        let mut columns = Columns {
            is_extended: format.is_extended,
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
            ..Default::default()
        };
        if format.has_gps_time {
            columns.gps_time = Some(Vec::with_capacity(capacity));
        }
        if format.is_extended {
            columns.scan_channel = Some(Vec::with_capacity(capacity));
        }
        if format.has_color {
            columns.color = Some(Default::default());
        }
        if format.has_nir {
            columns.nir = Some(Vec::with_capacity(capacity));
        }
        columns
    }

    fn push(&mut self, point: &Point) {
        self.x.push(point.x);
        self.y.push(point.y);
        self.z.push(point.z);
        self.intensity.push(point.intensity);
        self.return_number.push(point.return_number);
        self.number_of_returns.push(point.number_of_returns);
        self.scan_direction
            .push(u8::from(point.scan_direction == ScanDirection::LeftToRight));
        self.edge_of_flight_line
            .push(u8::from(point.is_edge_of_flight_line));
        if point.is_overlap && !self.is_extended {
            self.classification.push(OVERLAP_CLASSIFICATION);
        } else {
            self.classification.push(u8::from(point.classification));
        }
        self.synthetic.push(u8::from(point.is_synthetic));
        self.key_point.push(u8::from(point.is_key_point));
        self.withheld.push(u8::from(point.is_withheld));
        self.overlap.push(u8::from(point.is_overlap));
        self.scan_angle.push(point.scan_angle);
        self.user_data.push(point.user_data);
        self.point_source_id.push(point.point_source_id);
        if let Some(gps_time) = self.gps_time.as_mut() {
            gps_time.push(point.gps_time.unwrap_or_default());
        }
        if let Some(scan_channel) = self.scan_channel.as_mut() {
            scan_channel.push(point.scanner_channel);
        }
        if let Some([red, green, blue]) = self.color.as_mut() {
            let color = point.color.unwrap_or(las::Color::new(0, 0, 0));
            red.push(color.red);
            green.push(color.green);
            blue.push(color.blue);
        }
        if let Some(nir) = self.nir.as_mut() {
            nir.push(point.nir.unwrap_or_default());
        }
    }

    fn into_point_cloud(self) -> Result<PointCloud> {
        let mut point_cloud = PointCloud::new();
        point_cloud.insert("X", Column::F64(self.x))?;
        point_cloud.insert("Y", Column::F64(self.y))?;
        point_cloud.insert("Z", Column::F64(self.z))?;
        point_cloud.insert("Intensity", Column::U16(self.intensity))?;
        point_cloud.insert("ReturnNumber", Column::U8(self.return_number))?;
        point_cloud.insert("NumberOfReturns", Column::U8(self.number_of_returns))?;
        point_cloud.insert("ScanDirectionFlag", Column::U8(self.scan_direction))?;
        point_cloud.insert("EdgeOfFlightLine", Column::U8(self.edge_of_flight_line))?;
        point_cloud.insert("Classification", Column::U8(self.classification))?;
        point_cloud.insert("Synthetic", Column::U8(self.synthetic))?;
        point_cloud.insert("KeyPoint", Column::U8(self.key_point))?;
        point_cloud.insert("Withheld", Column::U8(self.withheld))?;
        point_cloud.insert("Overlap", Column::U8(self.overlap))?;
        point_cloud.insert("ScanAngleRank", Column::F32(self.scan_angle))?;
        point_cloud.insert("UserData", Column::U8(self.user_data))?;
        point_cloud.insert("PointSourceId", Column::U16(self.point_source_id))?;
        if let Some(gps_time) = self.gps_time {
            point_cloud.insert("GpsTime", Column::F64(gps_time))?;
        }
        if let Some(scan_channel) = self.scan_channel {
            point_cloud.insert("ScanChannel", Column::U8(scan_channel))?;
        }
        if let Some([red, green, blue]) = self.color {
            point_cloud.insert("Red", Column::U16(red))?;
            point_cloud.insert("Green", Column::U16(green))?;
            point_cloud.insert("Blue", Column::U16(blue))?;
        }
        if let Some(nir) = self.nir {
            point_cloud.insert("Infrared", Column::U16(nir))?;
        }
        Ok(point_cloud)
    }
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    #[serde(rename = "readers.las")]
    las: LasMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct LasMetadata<'a> {
    filename: String,
    count: u64,
    major_version: u8,
    minor_version: u8,
    dataformat_id: u8,
    creation_year: Option<i32>,
    creation_doy: Option<u32>,
    project_id: Uuid,
    system_id: &'a str,
    software_id: &'a str,
    file_source_id: u16,
    scale_x: f64,
    scale_y: f64,
    scale_z: f64,
    offset_x: f64,
    offset_y: f64,
    offset_z: f64,
    minx: f64,
    miny: f64,
    minz: f64,
    maxx: f64,
    maxy: f64,
    maxz: f64,
    dimensions: Vec<&'a str>,
}

fn metadata(path: &Path, header: &Header, point_cloud: &PointCloud) -> Result<String> {
    let date = header.date();
    let transforms = header.transforms();
    let bounds = header.bounds();
    let dataformat_id = header
        .point_format()
        .to_u8()
        .map_err(|source| Error::Las {
            path: path.to_path_buf(),
            source,
        })?;
    let metadata = Metadata {
        las: LasMetadata {
            filename: path.display().to_string(),
            count: header.number_of_points(),
            major_version: header.version().major,
            minor_version: header.version().minor,
            dataformat_id,
            creation_year: date.map(|date| date.year()),
            creation_doy: date.map(|date| date.ordinal()),
            project_id: header.guid(),
            system_id: header.system_identifier(),
            software_id: header.generating_software(),
            file_source_id: header.file_source_id(),
            scale_x: transforms.x.scale,
            scale_y: transforms.y.scale,
            scale_z: transforms.z.scale,
            offset_x: transforms.x.offset,
            offset_y: transforms.y.offset,
            offset_z: transforms.z.offset,
            minx: bounds.min.x,
            miny: bounds.min.y,
            minz: bounds.min.z,
            maxx: bounds.max.x,
            maxy: bounds.max.y,
            maxz: bounds.max.z,
            dimensions: point_cloud.names().collect(),
        },
    };
    Ok(serde_json::to_string(&metadata)?)
}
