//! RPM deterioration lookup: `table[initial_rpm][interval]` gives the score a
//! victim has after `interval + 1` untreated half-hour periods.

use std::io::Read;

use bevy_ecs::prelude::Resource;

use crate::error::SimError;

pub const RPM_DETERIORATION_INTERVAL_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Resource)]
pub struct DeteriorationTable {
    rows: Vec<Vec<u32>>,
}

impl DeteriorationTable {
    pub fn new(rows: Vec<Vec<u32>>) -> Self {
        Self { rows }
    }

    /// Reads the `;`-separated layout: one header row, then one row per
    /// initial RPM whose first column is a label.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SimError> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv.records().enumerate() {
            let record = record?;
            let row = record
                .iter()
                .skip(1)
                .filter(|field| !field.trim().is_empty())
                .map(|field| {
                    field.trim().parse::<u32>().map_err(|_| SimError::MalformedTable {
                        row: index + 2,
                        reason: format!("{field:?} is not an RPM score"),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if row.is_empty() {
                return Err(SimError::MalformedTable {
                    row: index + 2,
                    reason: "row has no intervals".to_string(),
                });
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    /// Score after `interval_index + 1` intervals. Indexes past the last column
    /// stay at the last column; unknown initial scores do not decay.
    pub fn lookup(&self, initial_rpm: u32, interval_index: usize) -> u32 {
        self.rows
            .get(initial_rpm as usize)
            .and_then(|row| row.get(interval_index.min(row.len().saturating_sub(1))))
            .copied()
            .unwrap_or(initial_rpm)
    }

    pub fn row(&self, initial_rpm: u32) -> Option<&[u32]> {
        self.rows.get(initial_rpm as usize).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for DeteriorationTable {
    /// Six hours of half-hour intervals for every reachable score (0..=12).
    fn default() -> Self {
        Self::new(vec![
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![2, 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0],
            vec![3, 2, 2, 1, 1, 0, 0, 0, 0, 0, 0, 0],
            vec![4, 3, 2, 2, 1, 1, 0, 0, 0, 0, 0, 0],
            vec![5, 4, 3, 3, 2, 2, 1, 1, 0, 0, 0, 0],
            vec![6, 5, 4, 4, 3, 3, 2, 2, 1, 1, 0, 0],
            vec![8, 7, 6, 5, 4, 4, 3, 3, 2, 2, 1, 1],
            vec![9, 8, 7, 7, 6, 6, 5, 5, 4, 4, 3, 3],
            vec![11, 10, 10, 9, 9, 8, 8, 7, 7, 6, 6, 5],
            vec![12, 12, 11, 11, 10, 10, 10, 10, 9, 9, 8, 8],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rows_never_increase() {
        let table = DeteriorationTable::default();
        assert_eq!(table.len(), 13);
        for rpm in 0..=12 {
            let row = table.row(rpm).expect("row");
            assert!(row.windows(2).all(|w| w[0] >= w[1]), "row {rpm}: {row:?}");
            assert!(row[0] <= rpm);
        }
    }

    #[test]
    fn lookup_clamps_to_last_interval() {
        let table = DeteriorationTable::default();
        assert_eq!(table.lookup(12, 0), 12);
        assert_eq!(table.lookup(12, 11), 8);
        assert_eq!(table.lookup(12, 40), 8);
        assert_eq!(table.lookup(6, 0), 4);
        assert_eq!(table.lookup(99, 3), 99);
    }

    #[test]
    fn loads_semicolon_layout() {
        let data = "RPM;30;60;90\n0;0;0;0\n1;1;0;0\n2;2;1;0\n";
        let table = DeteriorationTable::from_csv_reader(data.as_bytes()).expect("table");
        assert_eq!(table.len(), 3);
        assert_eq!(table.row(2), Some(&[2, 1, 0][..]));
    }

    #[test]
    fn rejects_non_numeric_cells() {
        let data = "RPM;30\n0;zero\n";
        let err = DeteriorationTable::from_csv_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::MalformedTable { row: 2, .. }));
    }
}
