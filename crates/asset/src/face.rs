//! Face-record recognizer for `f` lines.
//!
//! One form is chosen per line and every slot of that line must use it:
//! `v//n` if the line contains `//`, otherwise the slash count of the first
//! reference picks `v/t/n`, `v/t` or `v`. References are kept raw (1-based or
//! negative); resolution against attribute counts happens in the parser.

/// Raw references of one triangular face, tagged by grammar form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceRecord {
    VertexOnly([i64; 3]),
    VertexTex([(i64, i64); 3]),
    VertexNormal([(i64, i64); 3]),
    VertexTexNormal([(i64, i64, i64); 3]),
}

/// A single face corner with whichever attributes its form carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corner {
    pub vertex: i64,
    pub texcoord: Option<i64>,
    pub normal: Option<i64>,
}

impl FaceRecord {
    /// The three corners in slot order.
    pub fn corners(&self) -> [Corner; 3] {
        match *self {
            FaceRecord::VertexOnly(v) => v.map(|vertex| Corner {
                vertex,
                texcoord: None,
                normal: None,
            }),
            FaceRecord::VertexTex(r) => r.map(|(vertex, t)| Corner {
                vertex,
                texcoord: Some(t),
                normal: None,
            }),
            FaceRecord::VertexNormal(r) => r.map(|(vertex, n)| Corner {
                vertex,
                texcoord: None,
                normal: Some(n),
            }),
            FaceRecord::VertexTexNormal(r) => r.map(|(vertex, t, n)| Corner {
                vertex,
                texcoord: Some(t),
                normal: Some(n),
            }),
        }
    }
}

/// A decoded face line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedFace {
    pub record: FaceRecord,
    /// References past the third one; they are not triangulated.
    pub ignored_refs: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Form {
    Vertex,
    VertexTex,
    VertexNormal,
    VertexTexNormal,
}

/// Decode the references of an `f` line (`rest` excludes the tag).
///
/// Returns a human-readable reason on failure.
pub fn parse_face(rest: &str) -> Result<ParsedFace, String> {
    let refs: Vec<&str> = rest.split_whitespace().collect();
    if refs.len() < 3 {
        return Err(format!("expected 3 vertex references, found {}", refs.len()));
    }

    let form = if rest.contains("//") {
        Form::VertexNormal
    } else {
        match refs[0].matches('/').count() {
            0 => Form::Vertex,
            1 => Form::VertexTex,
            2 => Form::VertexTexNormal,
            _ => return Err(format!("unrecognized reference '{}'", refs[0])),
        }
    };

    let slot = |i: usize| parse_ref(refs[i], form);
    let record = match form {
        Form::Vertex => FaceRecord::VertexOnly([slot(0)?[0], slot(1)?[0], slot(2)?[0]]),
        Form::VertexTex => {
            let [a, b, c] = [slot(0)?, slot(1)?, slot(2)?];
            FaceRecord::VertexTex([(a[0], a[1]), (b[0], b[1]), (c[0], c[1])])
        }
        Form::VertexNormal => {
            let [a, b, c] = [slot(0)?, slot(1)?, slot(2)?];
            FaceRecord::VertexNormal([(a[0], a[1]), (b[0], b[1]), (c[0], c[1])])
        }
        Form::VertexTexNormal => {
            let [a, b, c] = [slot(0)?, slot(1)?, slot(2)?];
            FaceRecord::VertexTexNormal([
                (a[0], a[1], a[2]),
                (b[0], b[1], b[2]),
                (c[0], c[1], c[2]),
            ])
        }
    };

    Ok(ParsedFace {
        record,
        ignored_refs: refs.len() - 3,
    })
}

/// Parse one reference in the given form. Unused trailing entries are 0.
fn parse_ref(token: &str, form: Form) -> Result<[i64; 3], String> {
    let fields: Vec<&str> = match form {
        Form::VertexNormal => match token.split_once("//") {
            Some((v, n)) => vec![v, n],
            None => return Err(format!("reference '{token}' is not in v//n form")),
        },
        _ => token.split('/').collect(),
    };

    let expected = match form {
        Form::Vertex => 1,
        Form::VertexTex | Form::VertexNormal => 2,
        Form::VertexTexNormal => 3,
    };
    if fields.len() != expected {
        return Err(format!(
            "reference '{token}' has {} fields, expected {expected}",
            fields.len()
        ));
    }

    let mut out = [0i64; 3];
    for (dst, field) in out.iter_mut().zip(&fields) {
        *dst = field
            .parse::<i64>()
            .map_err(|_| format!("invalid index '{field}' in reference '{token}'"))?;
    }
    Ok(out)
}
