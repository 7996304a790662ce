//! Assemble columns into the fixed las point schema.
//!
//! Assembly picks the dimensions the las point format can hold, casts them to the las field
//! types, and decides what to leave out. It does not write anything:
//!
//! ```
//! use las2hdf::{Column, Config, PointCloud, assemble};
//!
//! let mut point_cloud = PointCloud::new();
//! for name in ["X", "Y", "Z"] {
//!     point_cloud.insert(name, Column::F64(vec![1., 2.])).unwrap();
//! }
//! point_cloud.insert("Green", Column::U16(vec![0, 0])).unwrap();
//! let assembled = assemble::assemble(&point_cloud, &Config::default()).unwrap();
//! assert!(assembled.contains("X"));
//! assert!(!assembled.contains("Green")); // not every color channel is present
//! ```

use crate::{
    Column, Config, Error, PointCloud, Result,
    dimension::{self, DIMENSIONS, Field, Group, Role},
};
use las::{Version, point::Format};
use log::debug;

/// Columns cast to las field types, ready for the las encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Assembled {
    point_format: Format,
    version: Version,
    number_of_points: usize,
    fields: Vec<(Field, Column)>,
}

/// Builds the las schema from a set of named columns.
///
/// X, Y, and Z are required. Optional dimensions are copied if present and left out otherwise.
/// Grouped dimensions are copied only if the whole group is present. Columns that are not in the
/// dimension table are ignored.
///
/// Every value must fit its las field in the configured point format and version, so a
/// classification of 40 is a schema error for point format 3 even though it fits a `u8`.
pub fn assemble(point_cloud: &PointCloud, config: &Config) -> Result<Assembled> {
    let missing: Vec<String> = dimension::with_role(Role::Required)
        .filter(|dimension| !point_cloud.contains(dimension.name))
        .map(|dimension| dimension.name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingDimensions(missing));
    }

    let mut fields = Vec::with_capacity(DIMENSIONS.len());
    for dimension in DIMENSIONS.iter() {
        let Some(column) = point_cloud.get(dimension.name) else {
            continue;
        };
        if let Role::Grouped(group) = dimension.role {
            if !is_complete(group, point_cloud) {
                debug!(
                    "skipping {}, not every member of its group is present",
                    dimension.name
                );
                continue;
            }
        }
        let cast_error = |index| Error::DimensionCast {
            dimension: dimension.name.to_string(),
            value: column.display_value(index),
        };
        let column = column
            .cast_to(dimension.field.data_type())
            .map_err(&cast_error)?;
        if let (Some(max), Column::U8(values)) = (
            dimension
                .field
                .max_value(config.point_format(), config.las_version()),
            &column,
        ) {
            if let Some(index) = values.iter().position(|&value| value > max) {
                return Err(cast_error(index));
            }
        }
        fields.push((dimension.field, column));
    }
    for name in point_cloud.names() {
        if dimension::find(name).is_none() {
            debug!("{} has no las field, leaving it out", name);
        }
    }

    Ok(Assembled {
        point_format: config.point_format(),
        version: config.las_version(),
        number_of_points: point_cloud.number_of_points(),
        fields,
    })
}

fn is_complete(group: Group, point_cloud: &PointCloud) -> bool {
    group
        .members()
        .all(|dimension| point_cloud.contains(dimension.name))
}

impl Assembled {
    /// Returns the point format to write.
    pub fn point_format(&self) -> Format {
        self.point_format
    }

    /// Returns the las version to write.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the number of points.
    pub fn number_of_points(&self) -> usize {
        self.number_of_points
    }

    /// Returns the assembled fields, in las record order.
    pub fn fields(&self) -> &[(Field, Column)] {
        &self.fields
    }

    /// Returns true if the dimension with this name was assembled.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field.name() == name)
    }

    /// Returns the assembled column for this dimension name.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.fields
            .iter()
            .find(|(field, _)| field.name() == name)
            .map(|(_, column)| column)
    }
}
