//! Request path construction.
//!
//! A [`RequestPath`] is a resource kind followed by named parameters in
//! insertion order. Rendering skips absent and `false` parameters, renders a
//! `true` parameter as its bare name and everything else as its string form,
//! so `team/frc254/events/2022/simple` comes out of
//! `team, key=frc254, endpoint=events, year=2022, simple=true, keys=false`.

use std::fmt;

/// The value of one path parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathParam {
    Absent,
    Flag(bool),
    Value(String),
}

impl From<bool> for PathParam {
    fn from(flag: bool) -> Self {
        PathParam::Flag(flag)
    }
}

impl From<&str> for PathParam {
    fn from(value: &str) -> Self {
        PathParam::Value(value.to_string())
    }
}

impl From<String> for PathParam {
    fn from(value: String) -> Self {
        PathParam::Value(value)
    }
}

impl From<&String> for PathParam {
    fn from(value: &String) -> Self {
        PathParam::Value(value.clone())
    }
}

macro_rules! numeric_param {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PathParam {
                fn from(value: $ty) -> Self {
                    PathParam::Value(value.to_string())
                }
            }
        )*
    };
}

numeric_param!(u16, u32, u64, i32, i64, usize);

impl<T: Into<PathParam>> From<Option<T>> for PathParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(PathParam::Absent, Into::into)
    }
}

/// A request descriptor: resource kind plus ordered, named parameters.
///
/// Built once per call with [`RequestPath::param`] and then only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    kind: String,
    params: Vec<(String, PathParam)>,
}

impl RequestPath {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter. Order of calls is the order of path segments.
    pub fn param(mut self, name: &str, value: impl Into<PathParam>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    /// Renders the path relative to the API root, without leading or
    /// trailing slashes.
    pub fn build(&self) -> String {
        let mut segments = vec![self.kind.as_str()];
        for (name, value) in &self.params {
            match value {
                PathParam::Absent | PathParam::Flag(false) => {}
                PathParam::Flag(true) => segments.push(name),
                PathParam::Value(value) => segments.push(value),
            }
        }
        segments.join("/")
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}
