use crate::evaluation::score::HandType;
use crate::evaluation::score::HAND_TYPES;
use serde::Serialize;

/// outcome of one simulated showdown
#[derive(Debug, Clone)]
pub struct Trial {
    /// +1 win, 0 tie, -1 loss
    pub outcome: i8,
    pub our_type: HandType,
    pub opp_type: HandType,
    /// starting-hand class of the best opponent
    pub opp_class: String,
}

impl Trial {
    /// a failed deal counts as a tie of nothing against nobody
    pub fn neutral() -> Self {
        Self {
            outcome: 0,
            our_type: HandType::HighCard,
            opp_type: HandType::HighCard,
            opp_class: crate::cards::hole::UNKNOWN_CLASS.to_string(),
        }
    }
}

/// Win/tie/loss tally for one named hand or opponent class, with the
/// two 10x10 method matrices. The loss matrix is indexed opponent
/// first, so in both matrices the row belongs to the victor.
#[derive(Debug, Clone, Serialize)]
pub struct EquityResult {
    pub name: String,
    pub equity: f64,
    pub wins: u32,
    pub ties: u32,
    pub losses: u32,
    pub simulations: u32,
    pub win_method_matrix: [[u32; HAND_TYPES]; HAND_TYPES],
    pub loss_method_matrix: [[u32; HAND_TYPES]; HAND_TYPES],
}

impl EquityResult {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            equity: 0.0,
            wins: 0,
            ties: 0,
            losses: 0,
            simulations: 0,
            win_method_matrix: [[0; HAND_TYPES]; HAND_TYPES],
            loss_method_matrix: [[0; HAND_TYPES]; HAND_TYPES],
        }
    }

    /// fold one trial into this tally
    pub fn record(&mut self, trial: &Trial) {
        self.simulations += 1;
        let ours = u8::from(trial.our_type) as usize;
        let theirs = u8::from(trial.opp_type) as usize;
        match trial.outcome {
            1 => {
                self.wins += 1;
                self.win_method_matrix[ours][theirs] += 1;
            }
            0 => self.ties += 1,
            _ => {
                self.losses += 1;
                self.loss_method_matrix[theirs][ours] += 1;
            }
        }
    }

    /// recompute equity from the counters
    pub fn refresh(&mut self) {
        self.equity = if self.simulations > 0 {
            (self.wins as f64 + self.ties as f64 * 0.5) / self.simulations as f64
        } else {
            0.0
        };
    }

    /// add another tally's counters into this one; matrices are merged
    /// only when asked, they are the expensive part of the merge
    pub fn absorb(&mut self, other: &EquityResult, matrices: bool) {
        self.wins += other.wins;
        self.ties += other.ties;
        self.losses += other.losses;
        self.simulations += other.simulations;
        if matrices {
            self.absorb_matrices(other);
        }
    }

    /// element-wise merge of the method matrices alone
    pub fn absorb_matrices(&mut self, other: &EquityResult) {
        for i in 0..HAND_TYPES {
            for j in 0..HAND_TYPES {
                self.win_method_matrix[i][j] += other.win_method_matrix[i][j];
                self.loss_method_matrix[i][j] += other.loss_method_matrix[i][j];
            }
        }
    }

    pub fn matrix_sums(&self) -> (u32, u32) {
        let wins = self.win_method_matrix.iter().flatten().sum();
        let losses = self.loss_method_matrix.iter().flatten().sum();
        (wins, losses)
    }
}
