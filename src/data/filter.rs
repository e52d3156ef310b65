use ndarray::Axis;

use super::model::SleepData;

impl<F: Clone, L: Clone> SleepData<F, L> {
    /// Row indices contributed by any of `subjects`, in load order.
    ///
    /// Subjects that were not loaded contribute nothing.
    pub fn rows_for(&self, subjects: &[usize]) -> Vec<usize> {
        self.subject_rows
            .iter()
            .filter(|(s, _)| subjects.contains(s))
            .flat_map(|(_, rows)| rows.clone())
            .collect()
    }

    /// Restrict to `subjects`. Metadata is carried over unchanged.
    pub fn select_subjects(&self, subjects: &[usize]) -> SleepData<F, L> {
        let rows = self.rows_for(subjects);

        let mut subject_rows = Vec::new();
        let mut offset = 0;
        for (s, r) in self.subject_rows.iter().filter(|(s, _)| subjects.contains(s)) {
            subject_rows.push((*s, offset..offset + r.len()));
            offset += r.len();
        }

        SleepData {
            x: self.x.select(Axis(0), &rows),
            y: self.y.select(Axis(0), &rows),
            metadata: self.metadata.clone(),
            subject_rows,
        }
    }
}
