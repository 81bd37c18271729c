#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::commands::mask_secret;
use super::util::*;

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_short_string() {
    assert_eq!(truncate("Groceries", 10), "Groceries");
}

#[test]
fn test_truncate_long_string() {
    assert_eq!(truncate("Entertainment", 6), "Enter…");
}

#[test]
fn test_truncate_zero_max() {
    assert_eq!(truncate("Rent", 0), "");
}

#[test]
fn test_truncate_multibyte() {
    assert_eq!(truncate("café résumé", 5), "café…");
}

// ── format_amount ──────────────────────────────────────────

#[test]
fn test_format_amount_thousands() {
    assert_eq!(format_amount(dec!(1234567.89)), "$1,234,567.89");
}

#[test]
fn test_format_amount_pads_decimals() {
    assert_eq!(format_amount(dec!(250.5)), "$250.50");
    assert_eq!(format_amount(dec!(0)), "$0.00");
}

#[test]
fn test_format_amount_negative() {
    assert_eq!(format_amount(dec!(-42.5)), "-$42.50");
}

#[test]
fn test_format_amount_rounds() {
    assert_eq!(format_amount(dec!(19.999)), "$20.00");
}

// ── spend_ratio / progress_bar ──────────────────────────────

#[test]
fn test_spend_ratio() {
    assert_eq!(spend_ratio(dec!(50), dec!(200)), 0.25);
    assert_eq!(spend_ratio(dec!(300), dec!(200)), 1.0);
    assert_eq!(spend_ratio(dec!(0), dec!(0)), 0.0);
    assert_eq!(spend_ratio(dec!(5), dec!(0)), 1.0);
}

#[test]
fn test_progress_bar_width() {
    assert_eq!(progress_bar(0.0, 4), "[░░░░]");
    assert_eq!(progress_bar(0.5, 4), "[██░░]");
    assert_eq!(progress_bar(1.0, 4), "[████]");
    assert_eq!(progress_bar(7.0, 4), "[████]");
}

// ── scrolling ───────────────────────────────────────────────

#[test]
fn test_scroll_down_moves_window() {
    let (mut index, mut scroll) = (2, 0);
    scroll_down(&mut index, &mut scroll, 10, 3);
    assert_eq!((index, scroll), (3, 1));
}

#[test]
fn test_scroll_down_stops_at_end() {
    let (mut index, mut scroll) = (4, 2);
    scroll_down(&mut index, &mut scroll, 5, 3);
    assert_eq!((index, scroll), (4, 2));
}

#[test]
fn test_scroll_up_pulls_window() {
    let (mut index, mut scroll) = (3, 3);
    scroll_up(&mut index, &mut scroll);
    assert_eq!((index, scroll), (2, 2));
}

#[test]
fn test_scroll_to_bottom() {
    let (mut index, mut scroll) = (0, 0);
    scroll_to_bottom(&mut index, &mut scroll, 10, 4);
    assert_eq!((index, scroll), (9, 6));
    scroll_to_top(&mut index, &mut scroll);
    assert_eq!((index, scroll), (0, 0));
}

// ── mask_secret ─────────────────────────────────────────────

#[test]
fn test_mask_secret_login() {
    assert_eq!(mask_secret("login ann@example.com hunter2"), "login ann@example.com *******");
}

#[test]
fn test_mask_secret_register_keeps_name_and_email() {
    assert_eq!(mask_secret("register Ann a@b pw"), "register Ann a@b **");
}

#[test]
fn test_mask_secret_other_commands_untouched() {
    assert_eq!(mask_secret("budget Groceries 250"), "budget Groceries 250");
}

#[test]
fn test_mask_secret_name_with_spaces() {
    assert_eq!(mask_secret("register Ann Lee a@b pw"), "register Ann Lee a@b **");
    assert_eq!(mask_secret("login ann@example.com"), "login ann@example.com");
}

#[test]
fn test_mask_secret_wide_space_separator() {
    assert_eq!(mask_secret("login a@b x\u{3000}pw"), "login a@b x\u{3000}**");
    assert_eq!(mask_secret("login a@b\u{3000}pw"), "login a@b\u{3000}**");
}
