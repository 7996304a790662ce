//! Typed columns and the columnar point cloud built from them.
//!
//! A `PointCloud` is a mapping from dimension name to a `Column` of exactly the same length:
//!
//! ```
//! use las2hdf::{Column, PointCloud};
//!
//! let mut point_cloud = PointCloud::new();
//! point_cloud.insert("X", Column::F64(vec![1., 2.])).unwrap();
//! point_cloud.insert("Intensity", Column::U16(vec![10, 20])).unwrap();
//! assert_eq!(point_cloud.number_of_points(), 2);
//!
//! // Every column has to match the point count.
//! assert!(point_cloud.insert("Y", Column::F64(vec![1.])).is_err());
//! ```

use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use num_traits::{NumCast, ToPrimitive};
use std::fmt;

/// The element type of a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DataType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// Utf8 text, only stored as a scalar.
    Text,
}

impl DataType {
    /// Creates a data type from its on-disk code.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::DataType;
    /// assert_eq!(DataType::F64, DataType::from_code(9).unwrap());
    /// assert!(DataType::from_code(42).is_err());
    /// ```
    pub fn from_code(code: u8) -> Result<DataType> {
        Ok(match code {
            0 => DataType::U8,
            1 => DataType::I8,
            2 => DataType::U16,
            3 => DataType::I16,
            4 => DataType::U32,
            5 => DataType::I32,
            6 => DataType::U64,
            7 => DataType::I64,
            8 => DataType::F32,
            9 => DataType::F64,
            10 => DataType::Text,
            _ => return Err(Error::UnknownDataType(code)),
        })
    }

    /// Returns the on-disk code of this data type.
    pub fn code(&self) -> u8 {
        match self {
            DataType::U8 => 0,
            DataType::I8 => 1,
            DataType::U16 => 2,
            DataType::I16 => 3,
            DataType::U32 => 4,
            DataType::I32 => 5,
            DataType::U64 => 6,
            DataType::I64 => 7,
            DataType::F32 => 8,
            DataType::F64 => 9,
            DataType::Text => 10,
        }
    }

    /// Returns the size of one element, in bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::DataType;
    /// assert_eq!(2, DataType::U16.size());
    /// assert_eq!(8, DataType::F64.size());
    /// ```
    pub fn size(&self) -> usize {
        match self {
            DataType::U8 | DataType::I8 | DataType::Text => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::U64 | DataType::I64 | DataType::F64 => 8,
        }
    }

    /// Returns true if this is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::U8 => "uint8",
            DataType::I8 => "int8",
            DataType::U16 => "uint16",
            DataType::I16 => "int16",
            DataType::U32 => "uint32",
            DataType::I32 => "int32",
            DataType::U64 => "uint64",
            DataType::I64 => "int64",
            DataType::F32 => "float32",
            DataType::F64 => "float64",
            DataType::Text => "text",
        };
        f.write_str(name)
    }
}

/// A typed array holding one value per point.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Column {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! each_column {
    ($column:expr, $values:ident => $body:expr) => {
        match $column {
            Column::U8($values) => $body,
            Column::I8($values) => $body,
            Column::U16($values) => $body,
            Column::I16($values) => $body,
            Column::U32($values) => $body,
            Column::I32($values) => $body,
            Column::U64($values) => $body,
            Column::I64($values) => $body,
            Column::F32($values) => $body,
            Column::F64($values) => $body,
        }
    };
}

impl Column {
    /// Returns the number of values in this column.
    pub fn len(&self) -> usize {
        each_column!(self, values => values.len())
    }

    /// Returns true if this column has no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns this column's element type.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::{Column, DataType};
    /// assert_eq!(DataType::U16, Column::U16(vec![1, 2]).data_type());
    /// ```
    pub fn data_type(&self) -> DataType {
        match self {
            Column::U8(_) => DataType::U8,
            Column::I8(_) => DataType::I8,
            Column::U16(_) => DataType::U16,
            Column::I16(_) => DataType::I16,
            Column::U32(_) => DataType::U32,
            Column::I32(_) => DataType::I32,
            Column::U64(_) => DataType::U64,
            Column::I64(_) => DataType::I64,
            Column::F32(_) => DataType::F32,
            Column::F64(_) => DataType::F64,
        }
    }

    /// Encodes the values as little endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.len() * self.data_type().size()];
        match self {
            Column::U8(values) => bytes.copy_from_slice(values),
            Column::I8(values) => {
                for (byte, &value) in bytes.iter_mut().zip(values) {
                    *byte = value as u8;
                }
            }
            Column::U16(values) => LittleEndian::write_u16_into(values, &mut bytes),
            Column::I16(values) => LittleEndian::write_i16_into(values, &mut bytes),
            Column::U32(values) => LittleEndian::write_u32_into(values, &mut bytes),
            Column::I32(values) => LittleEndian::write_i32_into(values, &mut bytes),
            Column::U64(values) => LittleEndian::write_u64_into(values, &mut bytes),
            Column::I64(values) => LittleEndian::write_i64_into(values, &mut bytes),
            Column::F32(values) => LittleEndian::write_f32_into(values, &mut bytes),
            Column::F64(values) => LittleEndian::write_f64_into(values, &mut bytes),
        }
        bytes
    }

    /// Decodes a column from little endian bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::{Column, DataType};
    /// let column = Column::from_le_bytes(DataType::U16, &[1, 0, 2, 0]).unwrap();
    /// assert_eq!(Column::U16(vec![1, 2]), column);
    /// assert!(Column::from_le_bytes(DataType::U16, &[1, 0, 2]).is_err());
    /// ```
    pub fn from_le_bytes(data_type: DataType, bytes: &[u8]) -> Result<Column> {
        let size = data_type.size();
        if bytes.len() % size != 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "{} bytes is not a whole number of {} values",
                    bytes.len(),
                    data_type
                ),
            )
            .into());
        }
        let n = bytes.len() / size;
        Ok(match data_type {
            DataType::U8 => Column::U8(bytes.to_vec()),
            DataType::I8 => Column::I8(bytes.iter().map(|&b| b as i8).collect()),
            DataType::U16 => {
                let mut values = vec![0; n];
                LittleEndian::read_u16_into(bytes, &mut values);
                Column::U16(values)
            }
            DataType::I16 => {
                let mut values = vec![0; n];
                LittleEndian::read_i16_into(bytes, &mut values);
                Column::I16(values)
            }
            DataType::U32 => {
                let mut values = vec![0; n];
                LittleEndian::read_u32_into(bytes, &mut values);
                Column::U32(values)
            }
            DataType::I32 => {
                let mut values = vec![0; n];
                LittleEndian::read_i32_into(bytes, &mut values);
                Column::I32(values)
            }
            DataType::U64 => {
                let mut values = vec![0; n];
                LittleEndian::read_u64_into(bytes, &mut values);
                Column::U64(values)
            }
            DataType::I64 => {
                let mut values = vec![0; n];
                LittleEndian::read_i64_into(bytes, &mut values);
                Column::I64(values)
            }
            DataType::F32 => {
                let mut values = vec![0.; n];
                LittleEndian::read_f32_into(bytes, &mut values);
                Column::F32(values)
            }
            DataType::F64 => {
                let mut values = vec![0.; n];
                LittleEndian::read_f64_into(bytes, &mut values);
                Column::F64(values)
            }
            DataType::Text => return Err(Error::UnsupportedDataType(data_type)),
        })
    }

    /// Casts every value into `T`.
    ///
    /// Returns the index of the first value that does not fit, e.g. a negative number into an
    /// unsigned type or a fractional float into an integer type.
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::Column;
    /// assert_eq!(Ok(vec![1u8, 2]), Column::F64(vec![1., 2.]).cast::<u8>());
    /// assert_eq!(Err(1), Column::I16(vec![1, -1]).cast::<u8>());
    /// assert_eq!(Err(0), Column::F64(vec![1.5]).cast::<u8>());
    /// ```
    pub fn cast<T: NumCast>(&self) -> std::result::Result<Vec<T>, usize> {
        let float_to_integer = self.data_type().is_float() && T::from(0.5f64).is_none_or(is_zero);
        each_column!(self, values => values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                if float_to_integer && value.to_f64().is_none_or(|v| v.fract() != 0.) {
                    return Err(i);
                }
                T::from(value).ok_or(i)
            })
            .collect())
    }

    /// Casts every value into a column of the given data type.
    ///
    /// Returns the index of the first value that does not fit, see [Column::cast].
    ///
    /// # Examples
    ///
    /// ```
    /// use las2hdf::{Column, DataType};
    /// let column = Column::I32(vec![1, 2]).cast_to(DataType::U8).unwrap();
    /// assert_eq!(Column::U8(vec![1, 2]), column);
    /// ```
    pub fn cast_to(&self, data_type: DataType) -> std::result::Result<Column, usize> {
        if self.data_type() == data_type {
            return Ok(self.clone());
        }
        Ok(match data_type {
            DataType::U8 => Column::U8(self.cast()?),
            DataType::I8 => Column::I8(self.cast()?),
            DataType::U16 => Column::U16(self.cast()?),
            DataType::I16 => Column::I16(self.cast()?),
            DataType::U32 => Column::U32(self.cast()?),
            DataType::I32 => Column::I32(self.cast()?),
            DataType::U64 => Column::U64(self.cast()?),
            DataType::I64 => Column::I64(self.cast()?),
            DataType::F32 => Column::F32(self.cast()?),
            DataType::F64 => Column::F64(self.cast()?),
            DataType::Text => return Err(0),
        })
    }

    /// Formats the value at `index` for error messages.
    pub fn display_value(&self, index: usize) -> String {
        each_column!(self, values => values
            .get(index)
            .map(|value| value.to_string())
            .unwrap_or_default())
    }
}

fn is_zero<T: NumCast>(value: T) -> bool {
    value.to_f64() == Some(0.)
}

/// A point cloud stored column by column.
///
/// Columns keep their insertion order, which is the dimension order of the source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    columns: Vec<(String, Column)>,
}

impl PointCloud {
    /// Creates an empty point cloud.
    pub fn new() -> PointCloud {
        PointCloud::default()
    }

    /// Inserts a column, replacing any column with the same name.
    ///
    /// The first column sets the point count. Later columns must have exactly that many values.
    pub fn insert<S: Into<String>>(&mut self, name: S, column: Column) -> Result<()> {
        let name = name.into();
        if let Some(expected) = self.number_of_points_checked() {
            if column.len() != expected {
                return Err(Error::DimensionLength {
                    dimension: name,
                    expected,
                    found: column.len(),
                });
            }
        }
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = column;
        } else {
            self.columns.push((name, column));
        }
        Ok(())
    }

    /// Returns the column with this exact name.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, column)| column)
    }

    /// Returns true if there is a column with this exact name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the dimension names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Returns an iterator over `(name, column)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns
            .iter()
            .map(|(name, column)| (name.as_str(), column))
    }

    /// Returns the number of points, zero if there are no columns.
    pub fn number_of_points(&self) -> usize {
        self.number_of_points_checked().unwrap_or(0)
    }

    /// Returns the number of dimensions.
    pub fn number_of_dimensions(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn number_of_points_checked(&self) -> Option<usize> {
        self.columns.first().map(|(_, column)| column.len())
    }
}

impl IntoIterator for PointCloud {
    type Item = (String, Column);
    type IntoIter = std::vec::IntoIter<(String, Column)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_codes() {
        for code in 0..=10 {
            assert_eq!(code, DataType::from_code(code).unwrap().code());
        }
        assert!(DataType::from_code(11).is_err());
    }

    #[test]
    fn le_bytes() {
        let column = Column::I32(vec![-1, 0, 1 << 20]);
        let bytes = column.to_le_bytes();
        assert_eq!(12, bytes.len());
        assert_eq!([0xff, 0xff, 0xff, 0xff], bytes[0..4]);
        assert_eq!(column, Column::from_le_bytes(DataType::I32, &bytes).unwrap());

        let column = Column::I8(vec![-2, 3]);
        assert_eq!(vec![0xfe, 3], column.to_le_bytes());
    }

    #[test]
    fn text_is_not_a_column() {
        assert!(Column::from_le_bytes(DataType::Text, b"abc").is_err());
    }

    #[test]
    fn cast_integers() {
        assert_eq!(Ok(vec![1u16, 300]), Column::U32(vec![1, 300]).cast::<u16>());
        assert_eq!(Err(1), Column::U32(vec![1, 300]).cast::<u8>());
        assert_eq!(Ok(vec![-1i8]), Column::I64(vec![-1]).cast::<i8>());
    }

    #[test]
    fn cast_floats() {
        assert_eq!(Ok(vec![1.5f32]), Column::F64(vec![1.5]).cast::<f32>());
        assert_eq!(Ok(vec![1.5f64]), Column::F32(vec![1.5]).cast::<f64>());
        assert_eq!(Ok(vec![2u16]), Column::F32(vec![2.]).cast::<u16>());
        assert_eq!(Err(0), Column::F32(vec![2.25]).cast::<u16>());
        assert_eq!(Ok(vec![3.]), Column::U8(vec![3]).cast::<f64>());
    }

    #[test]
    fn insert_keeps_order() {
        let mut point_cloud = PointCloud::new();
        point_cloud.insert("Z", Column::F64(vec![0.])).unwrap();
        point_cloud.insert("X", Column::F64(vec![0.])).unwrap();
        assert_eq!(vec!["Z", "X"], point_cloud.names().collect::<Vec<_>>());
    }

    #[test]
    fn insert_replaces() {
        let mut point_cloud = PointCloud::new();
        point_cloud.insert("X", Column::F64(vec![0.])).unwrap();
        point_cloud.insert("Y", Column::F64(vec![0.])).unwrap();
        point_cloud.insert("X", Column::F64(vec![1.])).unwrap();
        assert_eq!(2, point_cloud.number_of_dimensions());
        assert_eq!(Some(&Column::F64(vec![1.])), point_cloud.get("X"));
    }

    #[test]
    fn insert_rejects_length_mismatch() {
        let mut point_cloud = PointCloud::new();
        point_cloud.insert("X", Column::F64(vec![0., 1.])).unwrap();
        point_cloud.insert("Y", Column::F64(vec![0., 1.])).unwrap();
        let error = point_cloud
            .insert("X", Column::F64(vec![0.]))
            .unwrap_err();
        assert!(matches!(error, Error::DimensionLength { expected: 2, found: 1, .. }));
    }

    #[test]
    fn point_count_is_fixed_once_established() {
        let mut point_cloud = PointCloud::new();
        point_cloud.insert("X", Column::F64(vec![0., 1.])).unwrap();
        assert!(point_cloud.insert("X", Column::F64(vec![0.])).is_err());
        assert_eq!(2, point_cloud.number_of_points());
        point_cloud.insert("X", Column::F64(vec![2., 3.])).unwrap();
        assert_eq!(Some(&Column::F64(vec![2., 3.])), point_cloud.get("X"));
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut point_cloud = PointCloud::new();
        point_cloud.insert("Red", Column::U16(vec![0])).unwrap();
        assert!(point_cloud.contains("Red"));
        assert!(!point_cloud.contains("red"));
    }
}
