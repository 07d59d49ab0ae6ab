//! Built-in seed corpus
//!
//! Hand-labeled descriptions used to bootstrap the model before any user
//! corrections exist. Every category has examples.

use crate::corpus::Corpus;
use crate::models::Category::{self, *};
use crate::models::LabeledExample;

const SEED_DATA: &[(&str, Category)] = &[
    // Food
    ("restaurant dinner", Food),
    ("coffee shop", Food),
    ("grocery store", Food),
    ("pizza delivery", Food),
    ("lunch meeting", Food),
    ("breakfast cafe", Food),
    ("fast food", Food),
    ("supermarket", Food),
    ("food truck", Food),
    ("mcdonalds", Food),
    ("burger king", Food),
    ("kfc", Food),
    ("subway sandwich", Food),
    ("taco bell", Food),
    ("chipotle", Food),
    ("pizza hut", Food),
    ("dominos", Food),
    ("starbucks", Food),
    ("dunkin donuts", Food),
    ("tim hortons", Food),
    ("walmart grocery", Food),
    ("target grocery", Food),
    ("whole foods", Food),
    ("trader joes", Food),
    ("kroger", Food),
    ("safeway", Food),
    ("restaurant bill", Food),
    ("dinner out", Food),
    ("lunch out", Food),
    ("breakfast out", Food),
    ("takeout", Food),
    ("food delivery", Food),
    ("groceries", Food),
    ("snacks", Food),
    ("drinks", Food),
    ("alcohol", Food),
    ("bar tab", Food),
    ("wine", Food),
    ("beer", Food),
    ("coffee", Food),
    ("lunch with friends", Food),
    ("dinner date", Food),
    ("brunch", Food),
    ("ice cream", Food),
    ("candy", Food),
    ("chocolates", Food),
    ("bakery", Food),
    ("deli sandwich", Food),
    ("sushi restaurant", Food),
    ("chinese food", Food),
    ("mexican food", Food),
    ("italian restaurant", Food),
    ("thai food", Food),
    ("indian restaurant", Food),
    ("japanese cuisine", Food),
    ("fast casual", Food),
    ("food court", Food),
    ("catering", Food),
    ("birthday cake", Food),
    ("party food", Food),
    ("wedding catering", Food),
    ("office lunch", Food),
    // Transport
    ("uber ride", Transport),
    ("lyft ride", Transport),
    ("taxi fare", Transport),
    ("gas station", Transport),
    ("fuel", Transport),
    ("gasoline", Transport),
    ("bus ticket", Transport),
    ("train ticket", Transport),
    ("subway card", Transport),
    ("metro card", Transport),
    ("parking fee", Transport),
    ("parking meter", Transport),
    ("car maintenance", Transport),
    ("oil change", Transport),
    ("car repair", Transport),
    ("flight booking", Transport),
    ("airline ticket", Transport),
    ("airport parking", Transport),
    ("rental car", Transport),
    ("car rental", Transport),
    ("toll road", Transport),
    ("car insurance", Transport),
    ("auto insurance", Transport),
    ("vehicle registration", Transport),
    ("dmv fee", Transport),
    ("car wash", Transport),
    ("tires", Transport),
    ("mechanic", Transport),
    ("garage", Transport),
    ("shell gas", Transport),
    ("bp gas", Transport),
    ("exxon gas", Transport),
    ("chevron gas", Transport),
    // Entertainment
    ("movie theater", Entertainment),
    ("cinema", Entertainment),
    ("movie ticket", Entertainment),
    ("concert ticket", Entertainment),
    ("music concert", Entertainment),
    ("festival", Entertainment),
    ("netflix subscription", Entertainment),
    ("spotify premium", Entertainment),
    ("hulu", Entertainment),
    ("disney plus", Entertainment),
    ("amazon prime video", Entertainment),
    ("youtube premium", Entertainment),
    ("gaming purchase", Entertainment),
    ("video game", Entertainment),
    ("playstation", Entertainment),
    ("xbox", Entertainment),
    ("nintendo", Entertainment),
    ("steam", Entertainment),
    ("book store", Entertainment),
    ("bookstore", Entertainment),
    ("magazine", Entertainment),
    ("newspaper", Entertainment),
    ("sports event", Entertainment),
    ("theater show", Entertainment),
    ("comedy show", Entertainment),
    ("amusement park", Entertainment),
    ("zoo", Entertainment),
    ("museum", Entertainment),
    ("art gallery", Entertainment),
    ("bowling", Entertainment),
    ("mini golf", Entertainment),
    ("arcade", Entertainment),
    ("gym membership", Entertainment),
    // Shopping
    ("clothing store", Shopping),
    ("clothes shopping", Shopping),
    ("fashion", Shopping),
    ("amazon purchase", Shopping),
    ("online shopping", Shopping),
    ("ebay", Shopping),
    ("electronics store", Shopping),
    ("best buy", Shopping),
    ("apple store", Shopping),
    ("home depot", Shopping),
    ("lowes", Shopping),
    ("hardware store", Shopping),
    ("target shopping", Shopping),
    ("walmart shopping", Shopping),
    ("costco", Shopping),
    ("pharmacy items", Shopping),
    ("cvs", Shopping),
    ("walgreens", Shopping),
    ("gift purchase", Shopping),
    ("birthday gift", Shopping),
    ("christmas gift", Shopping),
    ("department store", Shopping),
    ("mall shopping", Shopping),
    ("shoes", Shopping),
    ("jewelry", Shopping),
    ("makeup", Shopping),
    ("cosmetics", Shopping),
    ("furniture", Shopping),
    ("ikea", Shopping),
    ("home goods", Shopping),
    ("office supplies", Shopping),
    ("stationery", Shopping),
    // Bills
    ("electricity bill", Bills),
    ("electric bill", Bills),
    ("power bill", Bills),
    ("internet bill", Bills),
    ("wifi bill", Bills),
    ("broadband", Bills),
    ("phone bill", Bills),
    ("cell phone bill", Bills),
    ("mobile bill", Bills),
    ("rent payment", Bills),
    ("mortgage payment", Bills),
    ("house payment", Bills),
    ("insurance premium", Bills),
    ("health insurance", Bills),
    ("car insurance", Bills),
    ("home insurance", Bills),
    ("life insurance", Bills),
    ("water bill", Bills),
    ("gas bill", Bills),
    ("heating bill", Bills),
    ("cable bill", Bills),
    ("credit card payment", Bills),
    ("loan payment", Bills),
    ("student loan", Bills),
    ("mortgage", Bills),
    ("property tax", Bills),
    ("income tax", Bills),
    ("utility bill", Bills),
    ("hoa fee", Bills),
    ("subscription", Bills),
    // Healthcare
    ("doctor visit", Healthcare),
    ("physician", Healthcare),
    ("medical appointment", Healthcare),
    ("hospital bill", Healthcare),
    ("emergency room", Healthcare),
    ("urgent care", Healthcare),
    ("pharmacy prescription", Healthcare),
    ("medication", Healthcare),
    ("prescription", Healthcare),
    ("dental checkup", Healthcare),
    ("dentist", Healthcare),
    ("dental cleaning", Healthcare),
    ("eye exam", Healthcare),
    ("optometrist", Healthcare),
    ("glasses", Healthcare),
    ("contact lenses", Healthcare),
    ("physical therapy", Healthcare),
    ("chiropractor", Healthcare),
    ("medical test", Healthcare),
    ("blood test", Healthcare),
    ("x ray", Healthcare),
    ("mri scan", Healthcare),
    ("surgery", Healthcare),
    ("medical procedure", Healthcare),
    ("health checkup", Healthcare),
    ("annual exam", Healthcare),
    ("specialist", Healthcare),
    // Other
    ("bank fee", Other),
    ("atm fee", Other),
    ("overdraft fee", Other),
    ("donation", Other),
    ("charity", Other),
    ("gift", Other),
    ("subscription service", Other),
    ("membership fee", Other),
    ("annual fee", Other),
    ("pet care", Other),
    ("veterinarian", Other),
    ("pet food", Other),
    ("childcare", Other),
    ("babysitter", Other),
    ("daycare", Other),
    ("education", Other),
    ("tuition", Other),
    ("school supplies", Other),
    ("legal fee", Other),
    ("lawyer", Other),
    ("attorney", Other),
    ("investment", Other),
    ("savings", Other),
    ("retirement", Other),
    ("transfer", Other),
    ("cash withdrawal", Other),
    ("miscellaneous", Other),
];

/// The seed examples, in their fixed order
pub fn seed_examples() -> Vec<LabeledExample> {
    SEED_DATA
        .iter()
        .map(|&(text, category)| LabeledExample::seed(text, category))
        .collect()
}

/// A corpus containing only the seed examples
pub fn seed_corpus() -> Corpus {
    Corpus::from_seed(seed_examples())
}
