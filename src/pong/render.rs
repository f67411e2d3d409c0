//! Text rendering of the play field.

use crate::pong::env::{PADDLE_X, PongEnv};

/// Render the grid as bordered ASCII art, `|` for paddle cells and `O` for
/// the ball. The ball overdraws the paddle when they share a cell.
pub fn render_grid(env: &PongEnv) -> String {
    let width = env.width() as usize;
    let height = env.height() as usize;

    let mut grid = vec![vec![' '; width]; height];

    for offset in 0..env.paddle_height() {
        let y = env.paddle_y() + offset;
        if (0..env.height()).contains(&y) {
            grid[y as usize][PADDLE_X as usize] = '|';
        }
    }

    let ball = env.ball();
    if (0..env.height()).contains(&ball.y) && (0..env.width()).contains(&ball.x) {
        grid[ball.y as usize][ball.x as usize] = 'O';
    }

    let border = format!("+{}+", "-".repeat(width));
    let mut lines = Vec::with_capacity(height + 2);
    lines.push(border.clone());
    for row in &grid {
        lines.push(format!("|{}|", row.iter().collect::<String>()));
    }
    lines.push(border);

    lines.join("\n")
}
