//! The table of dimensions that can be written back to las.
//!
//! Every entry maps a dimension name, as the ingestion side names it, to its role and to the las
//! point field it is written into:
//!
//! ```
//! use las2hdf::dimension::{self, Group, Role};
//!
//! assert_eq!(Role::Required, dimension::find("X").unwrap().role);
//! assert_eq!(Role::Grouped(Group::Color), dimension::find("Green").unwrap().role);
//! assert!(dimension::find("green").is_none());
//! ```

use crate::{Column, DataType, Error, Result};
use las::{
    Color, Version,
    point::{Classification, Format, ScanDirection},
};

/// Classification code that las reserves for the overlap flag in legacy point formats.
pub const OVERLAP_CLASSIFICATION: u8 = 12;

/// How a dimension takes part in las assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Must be present, or no las file can be written.
    Required,
    /// Copied when present, omitted otherwise.
    Optional,
    /// Copied only when every member of the group is present.
    Grouped(Group),
}

/// A set of dimensions that are written all together or not at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Group {
    /// Red, green, and blue.
    Color,
}

impl Group {
    /// Returns the dimensions that belong to this group.
    pub fn members(self) -> impl Iterator<Item = &'static Dimension> {
        DIMENSIONS
            .iter()
            .filter(move |dimension| dimension.role == Role::Grouped(self))
    }
}

/// A las point field that a dimension is written into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Field {
    X,
    Y,
    Z,
    Intensity,
    ReturnNumber,
    NumberOfReturns,
    ScanDirection,
    EdgeOfFlightLine,
    Classification,
    ScanAngle,
    UserData,
    PointSourceId,
    GpsTime,
    Red,
    Green,
    Blue,
}

/// One entry in the dimension table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimension {
    /// The exact, case-sensitive dimension name.
    pub name: &'static str,
    /// The role of this dimension during assembly.
    pub role: Role,
    /// The las field this dimension is written into.
    pub field: Field,
}

/// Every dimension that can be written to las, in las record order.
pub const DIMENSIONS: [Dimension; 16] = [
    dimension("X", Role::Required, Field::X),
    dimension("Y", Role::Required, Field::Y),
    dimension("Z", Role::Required, Field::Z),
    dimension("Intensity", Role::Optional, Field::Intensity),
    dimension("ReturnNumber", Role::Optional, Field::ReturnNumber),
    dimension("NumberOfReturns", Role::Optional, Field::NumberOfReturns),
    dimension("ScanDirectionFlag", Role::Optional, Field::ScanDirection),
    dimension("EdgeOfFlightLine", Role::Optional, Field::EdgeOfFlightLine),
    dimension("Classification", Role::Optional, Field::Classification),
    dimension("ScanAngleRank", Role::Optional, Field::ScanAngle),
    dimension("UserData", Role::Optional, Field::UserData),
    dimension("PointSourceId", Role::Optional, Field::PointSourceId),
    dimension("GpsTime", Role::Optional, Field::GpsTime),
    dimension("Red", Role::Grouped(Group::Color), Field::Red),
    dimension("Green", Role::Grouped(Group::Color), Field::Green),
    dimension("Blue", Role::Grouped(Group::Color), Field::Blue),
];

const fn dimension(name: &'static str, role: Role, field: Field) -> Dimension {
    Dimension { name, role, field }
}

/// Returns the dimension with this exact name.
pub fn find(name: &str) -> Option<&'static Dimension> {
    DIMENSIONS.iter().find(|dimension| dimension.name == name)
}

/// Returns the dimensions with this role.
pub fn with_role(role: Role) -> impl Iterator<Item = &'static Dimension> {
    DIMENSIONS
        .iter()
        .filter(move |dimension| dimension.role == role)
}

impl Field {
    /// Returns the type of the las field.
    pub fn data_type(self) -> DataType {
        match self {
            Field::X | Field::Y | Field::Z | Field::GpsTime => DataType::F64,
            Field::Intensity | Field::PointSourceId | Field::Red | Field::Green | Field::Blue => {
                DataType::U16
            }
            Field::ReturnNumber
            | Field::NumberOfReturns
            | Field::ScanDirection
            | Field::EdgeOfFlightLine
            | Field::Classification
            | Field::UserData => DataType::U8,
            Field::ScanAngle => DataType::F32,
        }
    }

    /// Sets this field of `point` from the value at `index`.
    ///
    /// The column must already have this field's data type.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::Column;
    /// use las2hdf::dimension::Field;
    ///
    /// let mut point = las::Point::default();
    /// Field::Intensity.set(&mut point, &Column::U16(vec![7, 42]), 1).unwrap();
    /// assert_eq!(42, point.intensity);
    /// ```
    pub fn set(self, point: &mut las::Point, column: &Column, index: usize) -> Result<()> {
        match (self, column) {
            (Field::X, Column::F64(values)) => point.x = value(values, index)?,
            (Field::Y, Column::F64(values)) => point.y = value(values, index)?,
            (Field::Z, Column::F64(values)) => point.z = value(values, index)?,
            (Field::GpsTime, Column::F64(values)) => point.gps_time = Some(value(values, index)?),
            (Field::Intensity, Column::U16(values)) => point.intensity = value(values, index)?,
            (Field::PointSourceId, Column::U16(values)) => {
                point.point_source_id = value(values, index)?
            }
            (Field::Red, Column::U16(values)) => color(point).red = value(values, index)?,
            (Field::Green, Column::U16(values)) => color(point).green = value(values, index)?,
            (Field::Blue, Column::U16(values)) => color(point).blue = value(values, index)?,
            (Field::ReturnNumber, Column::U8(values)) => {
                point.return_number = value(values, index)?
            }
            (Field::NumberOfReturns, Column::U8(values)) => {
                point.number_of_returns = value(values, index)?
            }
            (Field::UserData, Column::U8(values)) => point.user_data = value(values, index)?,
            (Field::ScanDirection, Column::U8(values)) => {
                point.scan_direction = match value(values, index)? {
                    0 => ScanDirection::RightToLeft,
                    1 => ScanDirection::LeftToRight,
                    _ => return Err(self.cast_error(column, index)),
                }
            }
            (Field::EdgeOfFlightLine, Column::U8(values)) => {
                point.is_edge_of_flight_line = match value(values, index)? {
                    0 => false,
                    1 => true,
                    _ => return Err(self.cast_error(column, index)),
                }
            }
            (Field::Classification, Column::U8(values)) => {
                let code = value(values, index)?;
                if code == OVERLAP_CLASSIFICATION {
                    point.classification = Classification::Unclassified;
                    point.is_overlap = true;
                } else {
                    point.classification =
                        Classification::new(code).map_err(|_| self.cast_error(column, index))?;
                }
            }
            (Field::ScanAngle, Column::F32(values)) => point.scan_angle = value(values, index)?,
            _ => {
                return Err(Error::ShapeMismatch {
                    name: self.name().to_string(),
                    expected: "of the las field type",
                });
            }
        }
        Ok(())
    }

    /// Returns the largest value this field can hold in a las file of this format and version.
    ///
    /// Only the bit fields of the las point record have a limit narrower than their type.
    ///
    /// # Examples
    ///
    /// ```
    /// use las::{Version, point::Format};
    /// use las2hdf::dimension::Field;
    ///
    /// let legacy = Format::new(3).unwrap();
    /// assert_eq!(Some(5), Field::ReturnNumber.max_value(legacy, Version::new(1, 2)));
    /// assert_eq!(Some(31), Field::Classification.max_value(legacy, Version::new(1, 2)));
    /// assert_eq!(None, Field::Intensity.max_value(legacy, Version::new(1, 2)));
    /// ```
    pub fn max_value(self, format: Format, version: Version) -> Option<u8> {
        match self {
            Field::ReturnNumber if format.is_extended => Some(15),
            // Headers before 1.4 count points by return for returns one through five only.
            Field::ReturnNumber if version.major == 1 && version.minor < 4 => Some(5),
            Field::ReturnNumber | Field::NumberOfReturns if !format.is_extended => Some(7),
            Field::NumberOfReturns => Some(15),
            Field::Classification if !format.is_extended => Some(31),
            Field::ScanDirection | Field::EdgeOfFlightLine => Some(1),
            _ => None,
        }
    }

    /// Returns the name of the dimension that feeds this field.
    pub fn name(self) -> &'static str {
        DIMENSIONS
            .iter()
            .find(|dimension| dimension.field == self)
            .map(|dimension| dimension.name)
            .unwrap_or_default()
    }

    fn cast_error(self, column: &Column, index: usize) -> Error {
        Error::DimensionCast {
            dimension: self.name().to_string(),
            value: column.display_value(index),
        }
    }
}

fn value<T: Copy>(values: &[T], index: usize) -> Result<T> {
    values
        .get(index)
        .copied()
        .ok_or(Error::PointOutOfRange {
            index,
            number_of_points: values.len(),
        })
}

fn color(point: &mut las::Point) -> &mut Color {
    point.color.get_or_insert(Color::new(0, 0, 0))
}
