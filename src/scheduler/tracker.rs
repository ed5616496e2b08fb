use crate::types::{
    grid, AvailabilityWindow, Faculty, FacultyId, Room, RoomId, ScheduledSlot, SectionId, Subject,
    SubjectId, SubjectKind,
};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// One (day, period) cell of the weekly grid
pub type Cell = (u8, u8);

/// Why a commit was rejected or a pair of slots collides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    FacultyBusy,
    RoomBusy,
    SectionBusy,
    FacultyUnavailable,
    RoomUnavailable,
}

/// A rejected commit or a detected collision
#[derive(Debug, Clone)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub day: u8,
    pub period: u8,
    pub message: String,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} P{}: {}", grid::day_name(self.day), self.period, self.message)
    }
}

/// Dynamic per-resource occupancy. Owns the committed slot list; every
/// mutation goes through `try_commit`, which either applies the whole
/// slot or leaves the tracker untouched.
#[derive(Debug, Clone)]
pub struct OccupancyTracker {
    faculty_busy: HashMap<FacultyId, HashSet<Cell>>,
    room_busy: HashMap<RoomId, HashSet<Cell>>,
    section_busy: HashMap<SectionId, HashSet<Cell>>,
    /// Cells still legal for a faculty: declared windows (or the full
    /// grid if none) minus committed cells
    faculty_available: HashMap<FacultyId, HashSet<Cell>>,
    /// Cells still open in each room
    room_available: HashMap<RoomId, HashSet<Cell>>,
    subject_kinds: HashMap<SubjectId, SubjectKind>,
    committed: Vec<ScheduledSlot>,
}

/// Deep copy of tracker state, restorable any number of times
pub struct TrackerSnapshot(Box<OccupancyTracker>);

fn full_grid() -> HashSet<Cell> {
    (0..grid::DAYS_PER_WEEK)
        .flat_map(|d| (1..=grid::PERIODS_PER_DAY).map(move |p| (d, p)))
        .collect()
}

impl OccupancyTracker {
    pub fn new(
        rooms: &[Room],
        faculty: &[Faculty],
        windows: &[AvailabilityWindow],
        subjects: &[Subject],
    ) -> Self {
        let mut windows_by_faculty: HashMap<&FacultyId, HashSet<Cell>> = HashMap::new();
        for w in windows {
            let cells = windows_by_faculty.entry(&w.faculty_id).or_default();
            for p in w.start_period..=w.end_period {
                cells.insert((w.day, p));
            }
        }

        let faculty_available = faculty
            .iter()
            .map(|f| {
                let cells = windows_by_faculty
                    .get(&f.id)
                    .cloned()
                    .unwrap_or_else(full_grid);
                (f.id.clone(), cells)
            })
            .collect();

        let room_available = rooms.iter().map(|r| (r.id.clone(), full_grid())).collect();

        Self {
            faculty_busy: HashMap::new(),
            room_busy: HashMap::new(),
            section_busy: HashMap::new(),
            faculty_available,
            room_available,
            subject_kinds: subjects.iter().map(|s| (s.id.clone(), s.kind)).collect(),
            committed: Vec::new(),
        }
    }

    /// Atomically commit a slot. Every period in the range must be free
    /// for the slot's faculty, room and section, and present in the
    /// dynamic availability of the faculty and room. Any failure leaves
    /// the tracker unchanged.
    pub fn try_commit(&mut self, slot: &ScheduledSlot) -> Result<(), Conflict> {
        for p in slot.periods() {
            let cell = (slot.day, p);

            if self.is_busy(&self.faculty_busy, &slot.faculty_id, cell) {
                return Err(conflict(ConflictKind::FacultyBusy, cell, format!(
                    "faculty '{}' already teaching", slot.faculty_id
                )));
            }
            if self.is_busy(&self.room_busy, &slot.room_id, cell) {
                return Err(conflict(ConflictKind::RoomBusy, cell, format!(
                    "room '{}' already occupied", slot.room_id
                )));
            }
            if self.is_busy(&self.section_busy, &slot.section_id, cell) {
                return Err(conflict(ConflictKind::SectionBusy, cell, format!(
                    "section '{}' already in class", slot.section_id
                )));
            }
            if !self
                .faculty_available
                .get(&slot.faculty_id)
                .is_some_and(|cells| cells.contains(&cell))
            {
                return Err(conflict(ConflictKind::FacultyUnavailable, cell, format!(
                    "faculty '{}' not available", slot.faculty_id
                )));
            }
            if !self
                .room_available
                .get(&slot.room_id)
                .is_some_and(|cells| cells.contains(&cell))
            {
                return Err(conflict(ConflictKind::RoomUnavailable, cell, format!(
                    "room '{}' not available", slot.room_id
                )));
            }
        }

        for p in slot.periods() {
            let cell = (slot.day, p);
            self.faculty_busy.entry(slot.faculty_id.clone()).or_default().insert(cell);
            self.room_busy.entry(slot.room_id.clone()).or_default().insert(cell);
            self.section_busy.entry(slot.section_id.clone()).or_default().insert(cell);
            if let Some(cells) = self.faculty_available.get_mut(&slot.faculty_id) {
                cells.remove(&cell);
            }
            if let Some(cells) = self.room_available.get_mut(&slot.room_id) {
                cells.remove(&cell);
            }
        }
        self.committed.push(slot.clone());
        Ok(())
    }

    fn is_busy<K: std::hash::Hash + Eq>(
        &self,
        map: &HashMap<K, HashSet<Cell>>,
        key: &K,
        cell: Cell,
    ) -> bool {
        map.get(key).is_some_and(|cells| cells.contains(&cell))
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot(Box::new(self.clone()))
    }

    pub fn restore(&mut self, snapshot: &TrackerSnapshot) {
        *self = (*snapshot.0).clone();
    }

    /// Remaining available periods of a faculty on one day
    pub fn faculty_free_on(&self, faculty_id: &FacultyId, day: u8) -> usize {
        self.faculty_available
            .get(faculty_id)
            .map(|cells| cells.iter().filter(|(d, _)| *d == day).count())
            .unwrap_or(0)
    }

    /// Remaining available periods of a faculty across the week
    pub fn faculty_free_total(&self, faculty_id: &FacultyId) -> usize {
        self.faculty_available.get(faculty_id).map(HashSet::len).unwrap_or(0)
    }

    /// Free periods a section still has across the week
    pub fn section_free_total(&self, section_id: &SectionId) -> usize {
        grid::TOTAL_GRID_SLOTS
            - self.section_busy.get(section_id).map(HashSet::len).unwrap_or(0)
    }

    /// Periods a section already sits through on one day
    pub fn section_load_on(&self, section_id: &SectionId, day: u8) -> u8 {
        self.section_busy
            .get(section_id)
            .map(|cells| cells.iter().filter(|(d, _)| *d == day).count() as u8)
            .unwrap_or(0)
    }

    /// Periods a faculty teaches on one day, labs included
    pub fn faculty_load_on(&self, faculty_id: &FacultyId, day: u8) -> u8 {
        self.faculty_busy
            .get(faculty_id)
            .map(|cells| cells.iter().filter(|(d, _)| *d == day).count() as u8)
            .unwrap_or(0)
    }

    /// Theory periods a faculty teaches on one day. Labs occupy the
    /// grid but do not count against the theory day-balancing cap, so
    /// this walks the committed list and filters by subject kind.
    pub fn faculty_theory_load_on(&self, faculty_id: &FacultyId, day: u8) -> u8 {
        self.committed
            .iter()
            .filter(|s| {
                &s.faculty_id == faculty_id
                    && s.day == day
                    && self.subject_kinds.get(&s.subject_id) == Some(&SubjectKind::Theory)
            })
            .map(|s| s.span())
            .sum()
    }

    /// Periods of one subject a section already has on one day
    pub fn section_subject_load_on(
        &self,
        section_id: &SectionId,
        subject_id: &SubjectId,
        day: u8,
    ) -> u8 {
        self.committed
            .iter()
            .filter(|s| &s.section_id == section_id && &s.subject_id == subject_id && s.day == day)
            .map(|s| s.span())
            .sum()
    }

    /// Whether a faculty's dynamic availability admits a whole range
    pub fn faculty_admits(&self, faculty_id: &FacultyId, day: u8, start: u8, end: u8) -> bool {
        self.faculty_available
            .get(faculty_id)
            .is_some_and(|cells| (start..=end).all(|p| cells.contains(&(day, p))))
    }

    /// Whether a room is still open over a whole range
    pub fn room_admits(&self, room_id: &RoomId, day: u8, start: u8, end: u8) -> bool {
        self.room_available
            .get(room_id)
            .is_some_and(|cells| (start..=end).all(|p| cells.contains(&(day, p))))
    }

    /// Whether a section is free over a whole range
    pub fn section_free(&self, section_id: &SectionId, day: u8, start: u8, end: u8) -> bool {
        !(start..=end).any(|p| self.is_busy(&self.section_busy, section_id, (day, p)))
    }

    pub fn committed_slots(&self) -> &[ScheduledSlot] {
        &self.committed
    }

    /// Defensive post-hoc pairwise check over a finished schedule
    pub fn validate_whole(&self, slots: &[ScheduledSlot]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for (a, b) in slots.iter().tuple_combinations() {
            if !a.overlaps(b) {
                continue;
            }
            let period = a.start_period.max(b.start_period);
            if a.faculty_id == b.faculty_id {
                conflicts.push(conflict(ConflictKind::FacultyBusy, (a.day, period), format!(
                    "faculty '{}' double-booked: [{}] vs [{}]", a.faculty_id, a, b
                )));
            }
            if a.room_id == b.room_id {
                conflicts.push(conflict(ConflictKind::RoomBusy, (a.day, period), format!(
                    "room '{}' double-booked: [{}] vs [{}]", a.room_id, a, b
                )));
            }
            if a.section_id == b.section_id {
                conflicts.push(conflict(ConflictKind::SectionBusy, (a.day, period), format!(
                    "section '{}' double-booked: [{}] vs [{}]", a.section_id, a, b
                )));
            }
        }
        conflicts
    }
}

fn conflict(kind: ConflictKind, cell: Cell, message: String) -> Conflict {
    Conflict {
        kind,
        day: cell.0,
        period: cell.1,
        message,
    }
}
