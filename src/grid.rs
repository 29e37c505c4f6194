use crate::error::PiomasError;

/// The flattened 2-D model grid: the canonical `grid` dimension downstream.
///
/// The remote `grid.dat` resource is a flat whitespace-separated float list,
/// x-coordinates first, y-coordinates second, both halves equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Grid {
    /// Number of grid cells (G). 360 x 120 = 43200 for the production grid.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

pub fn parse_grid(text: &str) -> Result<Grid, PiomasError> {
    let coords = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| PiomasError::GridParse(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if coords.len() % 2 != 0 {
        return Err(PiomasError::GridShape(coords.len()));
    }

    let count = coords.len() / 2;
    let y = coords[count..].to_vec();
    let mut x = coords;
    x.truncate(count);

    Ok(Grid { x, y })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_halves() {
        let grid = parse_grid("1.0 2.0 3.0\n10.0 20.0 30.0\n").unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.x, vec![1.0, 2.0, 3.0]);
        assert_eq!(grid.y, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn odd_coordinate_count_is_rejected() {
        let err = parse_grid("1.0 2.0 3.0").unwrap_err();
        assert_matches!(err, PiomasError::GridShape(3));
    }

    #[test]
    fn non_numeric_token_is_rejected() {
        let err = parse_grid("1.0 oops").unwrap_err();
        assert_matches!(err, PiomasError::GridParse(_));
    }
}
