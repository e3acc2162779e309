use ratatui::layout::Rect;

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width).max(1);
    let height = height.min(area.height).max(1);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// One asterisk per character.
pub fn masked(value: &str) -> String {
    "*".repeat(value.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_clamped_to_area() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 40,
            height: 10,
        };
        let rect = centered_rect(60, 4, area);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 3);
    }

    #[test]
    fn masked_hides_every_character() {
        assert_eq!(masked("pässword"), "********");
        assert_eq!(masked(""), "");
    }
}
