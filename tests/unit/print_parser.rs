//! Seller name extraction from print layouts

use dte_extractor::fetcher::print::extract_seller_name;
use dte_extractor::model::PrintDocument;

fn html(blocks: &[&str]) -> PrintDocument {
    PrintDocument {
        print_content: blocks.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn test_single_word_name_has_empty_last_name() {
    let name = extract_seller_name(&html(&["<b>VENDEDOR:</b>  Carla </td>"])).unwrap();
    assert_eq!(name.first_name, "Carla");
    assert_eq!(name.last_name, "");
}

#[test]
fn test_no_label_means_no_seller() {
    assert!(extract_seller_name(&html(&["<p>Cliente: ACME</p>"])).is_none());
    assert!(extract_seller_name(&PrintDocument::default()).is_none());
}

#[test]
fn test_empty_label_means_no_seller() {
    assert!(extract_seller_name(&html(&["<b>Vendedor:</b></td>"])).is_none());
}

#[test]
fn test_first_matching_block_wins() {
    let doc = html(&[
        "<b>Vendedor:</b> Pedro Soto",
        "<b>Vendedor:</b> Otro Nombre",
    ]);
    let name = extract_seller_name(&doc).unwrap();
    assert_eq!(name.first_name, "Pedro");
    assert_eq!(name.last_name, "Soto");
}
